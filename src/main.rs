use std::time::Duration;

use bot::BotService;
use config::AppConfig;
use state::AppState;

extern crate pretty_env_logger;
#[macro_use]
extern crate log;

mod bot;
mod command;
mod config;
mod error;
mod handler;
mod platform;
mod service;
mod state;
mod utils;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    let _ = pretty_env_logger::try_init_timed();

    info!("Starting bot...");

    let config = config::build_config()?;
    AppConfig::set_global(config)?;
    let config = AppConfig::get()?;

    let state = AppState::new(config);

    let host = config.server.host.clone();
    let port = config.server.port;
    tokio::spawn(async move {
        if let Err(e) = service::health::serve(host, port).await {
            error!("Health endpoint failed: {}", e);
        }
    });

    if let Some(url) = config.server.keepalive_url.clone() {
        service::health::spawn_keepalive(url, config.server.keepalive_interval_secs);
    }

    // old session entries are garbage, not state; sweep them periodically
    let sweeper_state = state.clone();
    let sweep_interval = config.session.sweep_interval_secs;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(sweep_interval.max(60)));
        loop {
            interval.tick().await;
            let dropped = sweeper_state.sessions.sweep_expired();
            if dropped > 0 {
                info!("Swept {} expired sessions", dropped);
            }
        }
    });

    let bot_service = BotService::new(config);
    info!("Bot instance created");

    bot_service
        .start(state)
        .await
        .map_err(|e| anyhow::anyhow!("Bot stopped: {}", e))?;

    Ok(())
}
