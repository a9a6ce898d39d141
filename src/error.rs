use crate::config::ConfigError;
use crate::platform::ResolutionError;
use crate::service::transcode::TranscodeError;

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("Unsupported link: {0}")]
    UnsupportedUrl(String),

    #[error("Transcode error: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("Telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type BotResult<T> = Result<T, BotError>;

pub type HandlerResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
