mod download;
mod error;
mod generic;
mod instagram;
mod model;
mod tiktok;
mod twitter;

use std::fmt;

use async_trait::async_trait;
use url::Url;

pub use download::{fetch_bytes, fetch_gallery};
pub use error::{ResolutionError, StrategyError};
pub use model::{MediaAsset, MediaKind, PrimaryMedia, ResolvedPost};

use crate::config::ResolverConfig;
use crate::utils::http;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    TikTok,
    Twitter,
    Instagram,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::TikTok => write!(f, "TikTok"),
            Platform::Twitter => write!(f, "Twitter"),
            Platform::Instagram => write!(f, "Instagram"),
        }
    }
}

impl Platform {
    /// Picks the resolver responsible for a URL by host. Returns `None` for
    /// hosts no chain knows how to handle.
    pub fn classify(url: &str) -> Option<Platform> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        let host = host.strip_prefix("www.").unwrap_or(host);

        if host == "tiktok.com" || host.ends_with(".tiktok.com") {
            Some(Platform::TikTok)
        } else if host == "twitter.com" || host == "x.com" {
            Some(Platform::Twitter)
        } else if host == "instagram.com" {
            Some(Platform::Instagram)
        } else {
            None
        }
    }
}

/// One way of turning a post URL into a `ResolvedPost`. Every strategy
/// normalizes its third-party response shape before returning, so nothing
/// platform-specific leaks past this boundary.
#[async_trait]
pub trait ResolveStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, url: &str) -> Result<ResolvedPost, StrategyError>;
}

/// Tries strategies in order until one succeeds. Recoverable failures fall
/// through to the next strategy; fatal ones short-circuit. Exhaustion yields
/// exactly one `ResolutionError` carrying the last cause.
pub async fn resolve_with_fallback(
    platform: Platform,
    strategies: &[Box<dyn ResolveStrategy>],
    url: &str,
) -> Result<ResolvedPost, ResolutionError> {
    let mut last: Option<StrategyError> = None;

    for strategy in strategies {
        match strategy.attempt(url).await {
            Ok(post) => {
                info!("{} resolved via {}", platform, strategy.name());
                return Ok(post);
            }
            Err(e) => {
                warn!("{} strategy {} failed: {}", platform, strategy.name(), e);
                let fatal = e.is_fatal();
                last = Some(e);
                if fatal {
                    break;
                }
            }
        }
    }

    Err(ResolutionError {
        platform,
        cause: last.unwrap_or(StrategyError::NoMedia),
    })
}

struct PlatformResolver {
    platform: Platform,
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

pub struct ResolverRegistry {
    resolvers: Vec<PlatformResolver>,
}

impl ResolverRegistry {
    pub fn new(config: &ResolverConfig) -> Self {
        info!("Initializing resolver registry");

        let api_client = http::create_api_client();
        let media_client = http::create_media_client();

        let ytdlp = || -> Box<dyn ResolveStrategy> {
            Box::new(generic::YtDlpStrategy::new(config.ytdlp_bin.clone()))
        };

        let resolvers = vec![
            PlatformResolver {
                platform: Platform::TikTok,
                strategies: vec![
                    Box::new(tiktok::TikwmStrategy::new(api_client.clone(), media_client.clone())),
                    ytdlp(),
                ],
            },
            PlatformResolver {
                platform: Platform::Twitter,
                strategies: vec![
                    Box::new(twitter::MirrorApiStrategy::new(
                        "api.vxtwitter.com",
                        api_client.clone(),
                        media_client.clone(),
                    )),
                    Box::new(twitter::MirrorApiStrategy::new(
                        "api.fixvx.com",
                        api_client.clone(),
                        media_client.clone(),
                    )),
                    ytdlp(),
                ],
            },
            PlatformResolver {
                platform: Platform::Instagram,
                strategies: vec![
                    Box::new(instagram::GraphApiStrategy::new(
                        config.instagram_doc_id.clone(),
                        api_client.clone(),
                        media_client.clone(),
                    )),
                    Box::new(instagram::EmbedProxyStrategy::new(
                        config.proxy_endpoint.clone(),
                        api_client,
                        media_client,
                    )),
                ],
            },
        ];

        info!("Resolver registry initialized");
        Self { resolvers }
    }

    pub async fn resolve(&self, platform: Platform, url: &str) -> Result<ResolvedPost, ResolutionError> {
        let resolver = self
            .resolvers
            .iter()
            .find(|r| r.platform == platform)
            .expect("every platform has a registered chain");

        resolve_with_fallback(platform, &resolver.strategies, url).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    struct ScriptedStrategy {
        name: &'static str,
        outcome: fn() -> Result<ResolvedPost, StrategyError>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ResolveStrategy for ScriptedStrategy {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn attempt(&self, _url: &str) -> Result<ResolvedPost, StrategyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()
        }
    }

    fn dummy_post() -> ResolvedPost {
        ResolvedPost {
            source_url: "https://example.com/post".to_string(),
            author_name: "alice".to_string(),
            author_url: "https://example.com/alice".to_string(),
            raw_caption: String::new(),
            primary: PrimaryMedia::Photo(MediaAsset::photo(bytes::Bytes::from_static(b"img"))),
            detached_audio: None,
            audio_file_name: "audio.mp3".to_string(),
        }
    }

    fn scripted(
        name: &'static str,
        outcome: fn() -> Result<ResolvedPost, StrategyError>,
    ) -> (Box<dyn ResolveStrategy>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = ScriptedStrategy {
            name,
            outcome,
            calls: Arc::clone(&calls),
        };
        (Box::new(strategy), calls)
    }

    #[tokio::test]
    async fn fallback_tries_next_strategy_on_recoverable_failure() {
        let (first, first_calls) = scripted("first", || Err(StrategyError::Payload("bad json".into())));
        let (second, second_calls) = scripted("second", || Ok(dummy_post()));

        let post = resolve_with_fallback(Platform::TikTok, &[first, second], "https://t.example/x")
            .await
            .expect("second strategy should win");

        assert_eq!(post.author_name, "alice");
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fallback_exhaustion_yields_single_resolution_error() {
        let (first, _) = scripted("first", || Err(StrategyError::Payload("one".into())));
        let (second, _) = scripted("second", || Err(StrategyError::RateLimited("two".into())));

        let err = resolve_with_fallback(Platform::Twitter, &[first, second], "https://t.example/x")
            .await
            .expect_err("all strategies failed");

        assert_eq!(err.platform, Platform::Twitter);
        assert!(matches!(err.cause, StrategyError::RateLimited(_)));
    }

    #[tokio::test]
    async fn fallback_stops_early_on_fatal_error() {
        let (first, _) = scripted("first", || Err(StrategyError::UnsupportedUrl("no status id".into())));
        let (second, second_calls) = scripted("second", || Ok(dummy_post()));

        let err = resolve_with_fallback(Platform::Twitter, &[first, second], "https://t.example/x")
            .await
            .expect_err("fatal error must not fall through");

        assert!(matches!(err.cause, StrategyError::UnsupportedUrl(_)));
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn classify_matches_supported_hosts() {
        assert_eq!(
            Platform::classify("https://vm.tiktok.com/ZMabc/"),
            Some(Platform::TikTok)
        );
        assert_eq!(
            Platform::classify("https://www.tiktok.com/@alice/video/123"),
            Some(Platform::TikTok)
        );
        assert_eq!(
            Platform::classify("https://x.com/alice/status/99"),
            Some(Platform::Twitter)
        );
        assert_eq!(
            Platform::classify("https://twitter.com/alice/status/99"),
            Some(Platform::Twitter)
        );
        assert_eq!(
            Platform::classify("https://www.instagram.com/p/C0de/"),
            Some(Platform::Instagram)
        );
        assert_eq!(Platform::classify("https://example.com/watch?v=1"), None);
        assert_eq!(Platform::classify("not a url"), None);
    }
}
