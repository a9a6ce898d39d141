use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MaybeInaccessibleMessage, ParseMode};

use super::message::{process_request, Intent};
use super::{keyboard, render};
use crate::error::HandlerResult;
use crate::service::caption::LangMode;
use crate::service::session::SessionKind;
use crate::state::AppState;
use crate::utils::build_caption;

const EXPIRED_TEXT: &str = "⌛ Це повідомлення застаріло.";
const EXTRACTING_TEXT: &str = "Витягую аудіо...";

#[derive(Debug, Clone, PartialEq)]
pub enum CallbackAction {
    VideoAudio { key: String },
    VideoClean { key: String },
    VideoLang { key: String, target: LangMode },
    PhotoClean { key: String },
    PhotoLang { key: String, target: LangMode },
}

impl CallbackAction {
    /// Payload formats: `action:key` and `action:param:key`.
    pub fn parse(data: &str) -> Option<Self> {
        let mut parts = data.split(':');
        let action = parts.next()?;
        let second = parts.next();
        let third = parts.next();
        if parts.next().is_some() {
            return None;
        }

        match (action, second, third) {
            ("vid_audio", Some(key), None) => Some(Self::VideoAudio { key: key.to_string() }),
            ("vid_clean", Some(key), None) => Some(Self::VideoClean { key: key.to_string() }),
            ("pho_clean", Some(key), None) => Some(Self::PhotoClean { key: key.to_string() }),
            ("vid_lang", Some(param), Some(key)) => Some(Self::VideoLang {
                key: key.to_string(),
                target: LangMode::from_callback_param(param)?,
            }),
            ("pho_lang", Some(param), Some(key)) => Some(Self::PhotoLang {
                key: key.to_string(),
                target: LangMode::from_callback_param(param)?,
            }),
            _ => None,
        }
    }

    fn key(&self) -> &str {
        match self {
            Self::VideoAudio { key }
            | Self::VideoClean { key }
            | Self::PhotoClean { key }
            | Self::VideoLang { key, .. }
            | Self::PhotoLang { key, .. } => key,
        }
    }
}

pub async fn handle_callback(bot: Throttle<Bot>, q: CallbackQuery, state: Arc<AppState>) -> HandlerResult<()> {
    let Some(data) = q.data.as_deref() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let Some(action) = CallbackAction::parse(data) else {
        warn!("Unknown callback payload: {}", data);
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let Some(message) = q.message.clone() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    // A miss means the process restarted or the entry aged out; answer with
    // a toast and leave the user's view untouched.
    let Some(handle) = state.sessions.get(action.key()) else {
        bot.answer_callback_query(q.id.clone())
            .text(EXPIRED_TEXT)
            .show_alert(true)
            .await?;
        return Ok(());
    };

    let chat_id = message.chat().id;

    match &action {
        CallbackAction::VideoClean { .. } => {
            let session = handle.lock().await;
            match session.video_file_id.clone() {
                Some(file_id) => {
                    drop(session);
                    bot.send_video(chat_id, InputFile::file_id(file_id)).await?;
                }
                None => {
                    let url = session.source_url.clone();
                    drop(session);
                    process_request(&bot, chat_id, &url, Intent::clean_via_button(), &state).await?;
                }
            }
            bot.answer_callback_query(q.id.clone()).await?;
        }

        CallbackAction::VideoAudio { .. } => {
            bot.answer_callback_query(q.id.clone()).text(EXTRACTING_TEXT).await?;

            let session = handle.lock().await;
            match session.audio.clone() {
                Some(audio) => {
                    drop(session);
                    bot.send_audio(chat_id, render::input_file(&audio)).await?;
                }
                None => {
                    let url = session.source_url.clone();
                    drop(session);
                    process_request(&bot, chat_id, &url, Intent::audio_via_button(), &state).await?;
                }
            }
        }

        CallbackAction::PhotoClean { .. } => {
            let session = handle.lock().await;
            if !render::resend_retained_clean(&bot, chat_id, &session).await? {
                let url = session.source_url.clone();
                drop(session);
                process_request(&bot, chat_id, &url, Intent::clean_via_button(), &state).await?;
            }
            bot.answer_callback_query(q.id.clone()).await?;
        }

        CallbackAction::VideoLang { target, .. } => {
            handle_video_lang(&bot, &message, &handle, action.key(), *target).await?;
            bot.answer_callback_query(q.id.clone()).await?;
        }

        CallbackAction::PhotoLang { target, .. } => {
            handle_photo_lang(&bot, &message, &handle, action.key(), *target).await?;
            bot.answer_callback_query(q.id.clone()).await?;
        }
    }

    Ok(())
}

async fn handle_video_lang(
    bot: &Throttle<Bot>,
    message: &MaybeInaccessibleMessage,
    handle: &crate::service::session::SessionHandle,
    key: &str,
    target: LangMode,
) -> HandlerResult<()> {
    let mut session = handle.lock().await;

    let caption = build_caption(
        &session.author_name,
        &session.author_url,
        session.caption.text(target),
        &session.source_url,
    );

    let edit = bot
        .edit_message_caption(message.chat().id, message.id())
        .caption(caption)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard::video_keyboard(key, target, session.caption.differs))
        .await;

    match edit {
        Ok(_) => session.lang_mode = target,
        // a double-tap on the same target edits to identical content,
        // which Telegram rejects
        Err(e) => warn!("Video caption edit failed: {}", e),
    }

    Ok(())
}

async fn handle_photo_lang(
    bot: &Throttle<Bot>,
    message: &MaybeInaccessibleMessage,
    handle: &crate::service::session::SessionHandle,
    key: &str,
    target: LangMode,
) -> HandlerResult<()> {
    let mut session = handle.lock().await;
    let chat_id = message.chat().id;

    let caption = build_caption(
        &session.author_name,
        &session.author_url,
        session.caption.text(target),
        &session.source_url,
    );
    let kb = keyboard::photo_keyboard(key, target, session.caption.differs);

    match session.kind {
        SessionKind::Gallery => {
            // Album captions cannot be edited in place; replace the
            // standalone caption message and re-point the session at it.
            let old_id = session.caption_message_id.take().unwrap_or_else(|| message.id());
            if let Err(e) = bot.delete_message(chat_id, old_id).await {
                warn!("Deleting old gallery caption failed: {}", e);
            }

            let sent = bot
                .send_message(chat_id, caption)
                .parse_mode(ParseMode::Html)
                .reply_markup(kb)
                .await?;

            session.caption_message_id = Some(sent.id);
            session.lang_mode = target;
        }
        _ => {
            if let Some(media_id) = session.media_message_id {
                match bot
                    .edit_message_caption(chat_id, media_id)
                    .caption(caption)
                    .parse_mode(ParseMode::Html)
                    .await
                {
                    Ok(_) => session.lang_mode = target,
                    Err(e) => warn!("Photo caption edit failed: {}", e),
                }
            }

            // refresh the toggle label on the options message
            if let Err(e) = bot
                .edit_message_reply_markup(chat_id, message.id())
                .reply_markup(kb)
                .await
            {
                warn!("Options keyboard refresh failed: {}", e);
            }
        }
    }

    Ok(())
}
