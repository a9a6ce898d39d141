use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::prelude::*;

use super::render;
use crate::error::{BotError, BotResult, HandlerResult};
use crate::platform::Platform;
use crate::service::caption::LangMode;
use crate::state::AppState;
use crate::utils::ParsedRequest;

const WORKING_TEXT: &str = "⏳ Обробляю...";
const FAILURE_TEXT: &str = "❌ Помилка завантаження.";
const UNSUPPORTED_TEXT: &str = "Непідтримуване посилання 🤷";

/// What the caller asked for, derived from in-text tokens or a button.
#[derive(Debug, Clone, Copy)]
pub struct Intent {
    pub clean: bool,
    pub audio: bool,
    pub translate_first: bool,
    pub via_button: bool,
}

impl Intent {
    pub fn clean_via_button() -> Self {
        Self {
            clean: true,
            audio: false,
            translate_first: false,
            via_button: true,
        }
    }

    pub fn audio_via_button() -> Self {
        Self {
            clean: false,
            audio: true,
            translate_first: false,
            via_button: true,
        }
    }

    fn standard(&self) -> bool {
        !self.clean && !self.audio
    }
}

pub async fn handle_link(
    bot: Throttle<Bot>,
    msg: Message,
    request: ParsedRequest,
    state: Arc<AppState>,
) -> HandlerResult<()> {
    info!("handle_link: {}", request.url);

    let intent = Intent {
        clean: request.clean,
        audio: request.audio,
        translate_first: request.translate,
        via_button: false,
    };

    process_request(&bot, msg.chat.id, &request.url, intent, &state).await
}

/// The full resolve → caption → deliver cycle for one URL. Also the entry
/// point for button-triggered re-resolves, with a narrowed intent.
pub async fn process_request(
    bot: &Throttle<Bot>,
    chat_id: ChatId,
    url: &str,
    intent: Intent,
    state: &AppState,
) -> HandlerResult<()> {
    let status_msg = if intent.standard() && !intent.via_button {
        Some(bot.send_message(chat_id, WORKING_TEXT).await?)
    } else {
        None
    };

    match run_pipeline(bot, chat_id, url, intent, state).await {
        Ok(()) => {
            if let Some(status) = status_msg {
                let _ = bot.delete_message(chat_id, status.id).await;
            }
        }
        Err(e) => {
            error!("Pipeline failed for {}: {}", url, e);
            let text = match &e {
                BotError::UnsupportedUrl(_) => UNSUPPORTED_TEXT,
                _ => FAILURE_TEXT,
            };
            match status_msg {
                Some(status) => {
                    let _ = bot.edit_message_text(chat_id, status.id, text).await;
                }
                // shortcut modes never had a status message; button flows
                // already answered with their own notice
                None if !intent.via_button => {
                    let _ = bot.send_message(chat_id, text).await;
                }
                None => {}
            }
        }
    }

    Ok(())
}

async fn run_pipeline(
    bot: &Throttle<Bot>,
    chat_id: ChatId,
    url: &str,
    intent: Intent,
    state: &AppState,
) -> BotResult<()> {
    let platform = Platform::classify(url).ok_or_else(|| BotError::UnsupportedUrl(url.to_string()))?;

    let post = state.resolvers.resolve(platform, url).await?;

    if intent.audio {
        return render::deliver_audio(bot, chat_id, &post, &state.transcoder).await;
    }

    if intent.clean {
        return render::deliver_clean(bot, chat_id, &post).await;
    }

    let rendering = state.captions.render(&post.raw_caption, intent.translate_first).await;

    let mode = if intent.translate_first && rendering.differs {
        LangMode::Translated
    } else {
        LangMode::Original
    };

    render::deliver_standard(bot, chat_id, &post, &rendering, mode, &state.sessions).await
}
