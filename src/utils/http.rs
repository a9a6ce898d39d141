use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub fn create_telegram_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(60))
        .tcp_keepalive(Duration::from_secs(30))
        .user_agent("TelegramBot/1.0")
        .build()
        .expect("Failed to build Telegram client")
}

/// Client for third-party resolver APIs. Short timeout: a hanging mirror
/// should fail over to the next strategy, not stall the update.
pub fn create_api_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(15))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(DEFAULT_USER_AGENT)
        .build()
        .expect("Failed to build API client")
}

/// Client for CDN media downloads, which can legitimately take a while.
pub fn create_media_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(DEFAULT_USER_AGENT)
        .build()
        .expect("Failed to build media client")
}
