use super::Platform;

/// Failure of a single resolution strategy. Almost everything is treated as
/// recoverable fuel for the fallback chain; only `UnsupportedUrl` stops the
/// chain early, since no sibling strategy can parse an id that is not there.
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected payload: {0}")]
    Payload(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("login required")]
    LoginRequired,

    #[error("post has no retrievable media")]
    NoMedia,

    #[error("external tool failed: {0}")]
    Tool(String),

    #[error("unsupported url: {0}")]
    UnsupportedUrl(String),
}

impl StrategyError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, StrategyError::UnsupportedUrl(_))
    }
}

/// All strategies of one platform's chain are exhausted.
#[derive(Debug, thiserror::Error)]
#[error("{platform} resolution failed: {cause}")]
pub struct ResolutionError {
    pub platform: Platform,
    pub cause: StrategyError,
}
