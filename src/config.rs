use std::sync::OnceLock;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing {0}")]
    Missing(String),
    #[error("Invalid {0}: {1}")]
    Invalid(String, String),
    #[error("Config already initialized")]
    AlreadySet,
    #[error("Config not initialized")]
    NotSet,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub server: ServerConfig,
    pub resolver: ResolverConfig,
    pub caption: CaptionConfig,
    pub session: SessionConfig,
}

#[derive(Clone, Debug)]
pub struct TelegramConfig(pub String);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub keepalive_url: Option<String>,
    pub keepalive_interval_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ResolverConfig {
    pub instagram_doc_id: String,
    pub proxy_endpoint: String,
    pub ytdlp_bin: String,
    pub ffmpeg_bin: String,
}

#[derive(Clone, Debug)]
pub struct CaptionConfig {
    /// Captions already in this language are delivered untranslated.
    pub target_lang: String,
    /// Target of the inverted policy, when the user explicitly asks for a
    /// translation of a caption that is already in the target language.
    pub secondary_lang: String,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub capacity: usize,
    pub ttl_secs: i64,
    pub sweep_interval_secs: u64,
}

impl AppConfig {
    pub fn set_global(config: AppConfig) -> Result<(), ConfigError> {
        APP_CONFIG.set(config).map_err(|_| ConfigError::AlreadySet)
    }

    pub fn get() -> Result<&'static AppConfig, ConfigError> {
        APP_CONFIG.get().ok_or(ConfigError::NotSet)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid(key.to_string(), raw)),
        Err(_) => Ok(default),
    }
}

pub fn build_config() -> Result<AppConfig, ConfigError> {
    info!("Building AppConfig...");

    let token = std::env::var("BOT_TOKEN").map_err(|_| ConfigError::Missing("BOT_TOKEN".to_string()))?;

    let config = AppConfig {
        telegram: TelegramConfig(token),
        server: ServerConfig {
            host: env_or("HOST", "0.0.0.0"),
            port: env_parse("PORT", 20000)?,
            keepalive_url: std::env::var("KEEPALIVE_URL").ok().filter(|url| !url.is_empty()),
            keepalive_interval_secs: env_parse("KEEPALIVE_INTERVAL_SECS", 600)?,
        },
        resolver: ResolverConfig {
            instagram_doc_id: env_or("INSTAGRAM_DOC_ID", "8845758582119845"),
            proxy_endpoint: env_or("PROXY_RESOLVER_ENDPOINT", "https://api.cobalt.tools/api/json"),
            ytdlp_bin: env_or("YTDLP_BIN", "yt-dlp"),
            ffmpeg_bin: env_or("FFMPEG_BIN", "ffmpeg"),
        },
        caption: CaptionConfig {
            target_lang: env_or("CAPTION_TARGET_LANG", "uk"),
            secondary_lang: env_or("CAPTION_SECONDARY_LANG", "en"),
        },
        session: SessionConfig {
            capacity: env_parse("SESSION_CAPACITY", 1000)?,
            ttl_secs: env_parse("SESSION_TTL_SECS", 6 * 60 * 60)?,
            sweep_interval_secs: env_parse("SESSION_SWEEP_INTERVAL_SECS", 15 * 60)?,
        },
    };

    info!("AppConfig built");

    Ok(config)
}
