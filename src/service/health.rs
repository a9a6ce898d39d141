use std::time::Duration;

use axum::{routing::get, Router};

/// Uptime plumbing only: hosting platforms probe `GET /` and idle the
/// process out without it.
pub fn router() -> Router {
    Router::new().route("/", get(alive))
}

async fn alive() -> &'static str {
    "Bot is alive!"
}

pub async fn serve(host: String, port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    info!("Health endpoint listening on {}:{}", host, port);
    axum::serve(listener, router()).await
}

/// Periodically pings our own public URL so free-tier hosts keep the
/// process warm.
pub fn spawn_keepalive(url: String, interval_secs: u64) {
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        interval.tick().await; // the first tick fires immediately

        loop {
            interval.tick().await;
            match client.get(&url).send().await {
                Ok(resp) => debug!("Keepalive ping {}: {}", url, resp.status()),
                Err(e) => warn!("Keepalive ping failed: {}", e),
            }
        }
    });
}
