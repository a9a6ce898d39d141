use std::sync::Arc;

use crate::config::AppConfig;
use crate::platform::ResolverRegistry;
use crate::service::caption::CaptionService;
use crate::service::session::SessionStore;
use crate::service::transcode::Transcoder;
use crate::service::translate::TranslationService;
use crate::utils::http;

/// Everything the handlers share. Injected through the dispatcher's
/// dependency map rather than a process-wide global, so lifetime and
/// eviction of the session store stay an explicit decision.
pub struct AppState {
    pub resolvers: ResolverRegistry,
    pub captions: CaptionService,
    pub sessions: SessionStore,
    pub transcoder: Transcoder,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Arc<Self> {
        info!("Initializing AppState...");

        let translator = TranslationService::new(http::create_api_client());

        let state = Arc::new(Self {
            resolvers: ResolverRegistry::new(&config.resolver),
            captions: CaptionService::new(translator, &config.caption),
            sessions: SessionStore::new(config.session.capacity, config.session.ttl_secs),
            transcoder: Transcoder::new(config.resolver.ffmpeg_bin.clone()),
        });

        info!("AppState initialized");
        state
    }
}
