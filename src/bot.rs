use std::sync::Arc;

use teloxide::adaptors::throttle::Limits;
use teloxide::adaptors::Throttle;
use teloxide::prelude::*;

use crate::config::AppConfig;
use crate::error::HandlerResult;
use crate::handler;
use crate::state::AppState;
use crate::utils::http;

pub struct BotService {
    pub bot: Throttle<Bot>,
}

impl BotService {
    pub fn new(config: &AppConfig) -> Self {
        let client = http::create_telegram_client();
        let bot = Bot::with_client(config.telegram.0.clone(), client).throttle(Limits::default());

        Self { bot }
    }

    pub async fn start(&self, state: Arc<AppState>) -> HandlerResult<()> {
        info!("Testing connection to Telegram API...");
        match self.bot.get_me().await {
            Ok(_) => info!("Successfully connected to Telegram API"),
            Err(e) => {
                error!("Failed to connect to Telegram API: {:?}", e);
                return Err(anyhow::anyhow!("Failed to connect to Telegram API: {}", e).into());
            }
        }

        crate::command::setup_bot_commands(&self.bot).await?;

        Dispatcher::builder(self.bot.clone(), handler::handler_tree())
            .dependencies(dptree::deps![state])
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}
