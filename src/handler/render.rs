use teloxide::adaptors::Throttle;
use teloxide::prelude::*;
use teloxide::types::{InputFile, InputMedia, InputMediaPhoto, InputMediaVideo, ParseMode};

use crate::error::BotResult;
use crate::handler::keyboard;
use crate::platform::{MediaAsset, MediaKind, PrimaryMedia, ResolvedPost};
use crate::service::caption::{CaptionRendering, LangMode};
use crate::service::session::{PostSession, SessionKind, SessionStore};
use crate::service::transcode::Transcoder;
use crate::utils::build_caption;

/// Telegram rejects grouped-media messages with more than ten items.
pub const MEDIA_GROUP_LIMIT: usize = 10;

const NO_AUDIO_TEXT: &str = "Не вдалося отримати аудіо 😔";

pub(crate) fn input_file(asset: &MediaAsset) -> InputFile {
    InputFile::memory(asset.bytes.clone()).file_name(asset.file_name.clone())
}

fn album_item(asset: &MediaAsset) -> InputMedia {
    match asset.kind {
        MediaKind::Video => InputMedia::Video(InputMediaVideo::new(input_file(asset))),
        _ => InputMedia::Photo(InputMediaPhoto::new(input_file(asset))),
    }
}

async fn send_album(bot: &Throttle<Bot>, chat_id: ChatId, assets: &[MediaAsset]) -> BotResult<()> {
    for chunk in assets.chunks(MEDIA_GROUP_LIMIT) {
        let group: Vec<InputMedia> = chunk.iter().map(album_item).collect();
        bot.send_media_group(chat_id, group).await?;
    }
    Ok(())
}

async fn send_trailing_audio(bot: &Throttle<Bot>, chat_id: ChatId, post: &ResolvedPost) {
    if post.primary.is_video() {
        return;
    }
    if let Some(audio) = &post.detached_audio {
        if let Err(e) = bot.send_audio(chat_id, input_file(audio)).await {
            warn!("Trailing audio send failed: {}", e);
        }
    }
}

/// Audio-only delivery. Prefers the detached soundtrack, then extraction
/// from the primary video; anything else means there is no audio to give.
pub async fn deliver_audio(
    bot: &Throttle<Bot>,
    chat_id: ChatId,
    post: &ResolvedPost,
    transcoder: &Transcoder,
) -> BotResult<()> {
    if let Some(audio) = &post.detached_audio {
        bot.send_audio(chat_id, input_file(audio)).await?;
        return Ok(());
    }

    if let PrimaryMedia::Video(video) = &post.primary {
        match transcoder.extract_audio(&video.bytes).await {
            Ok(bytes) => {
                bot.send_audio(
                    chat_id,
                    InputFile::memory(bytes).file_name(post.audio_file_name.clone()),
                )
                .await?;
                return Ok(());
            }
            Err(e) => warn!("Audio extraction failed: {}", e),
        }
    }

    bot.send_message(chat_id, NO_AUDIO_TEXT).await?;
    Ok(())
}

/// Clean delivery: media only, no caption, no keyboard, no session entry.
pub async fn deliver_clean(bot: &Throttle<Bot>, chat_id: ChatId, post: &ResolvedPost) -> BotResult<()> {
    match &post.primary {
        PrimaryMedia::Video(video) => {
            bot.send_video(chat_id, input_file(video)).await?;
        }
        PrimaryMedia::Photo(photo) => {
            bot.send_photo(chat_id, input_file(photo)).await?;
        }
        PrimaryMedia::Gallery(assets) => {
            send_album(bot, chat_id, assets).await?;
        }
    }

    send_trailing_audio(bot, chat_id, post).await;

    Ok(())
}

fn new_session(post: &ResolvedPost, rendering: &CaptionRendering, mode: LangMode, chat_id: ChatId) -> PostSession {
    let (kind, photo, gallery) = match &post.primary {
        PrimaryMedia::Video(_) => (SessionKind::Video, None, Vec::new()),
        PrimaryMedia::Photo(photo) => (SessionKind::Photo, Some(photo.clone()), Vec::new()),
        PrimaryMedia::Gallery(assets) => (SessionKind::Gallery, None, assets.clone()),
    };

    PostSession {
        source_url: post.source_url.clone(),
        author_name: post.author_name.clone(),
        author_url: post.author_url.clone(),
        caption: rendering.clone(),
        lang_mode: mode,
        kind,
        chat_id,
        video_file_id: None,
        photo,
        gallery,
        audio: post.detached_audio.clone(),
        audio_file_name: post.audio_file_name.clone(),
        media_message_id: None,
        caption_message_id: None,
    }
}

/// Standard delivery: media with caption and keyboard, registered in the
/// session store so the buttons can act on it later.
pub async fn deliver_standard(
    bot: &Throttle<Bot>,
    chat_id: ChatId,
    post: &ResolvedPost,
    rendering: &CaptionRendering,
    mode: LangMode,
    sessions: &SessionStore,
) -> BotResult<()> {
    let caption = build_caption(
        &post.author_name,
        &post.author_url,
        rendering.text(mode),
        &post.source_url,
    );
    let has_translation = rendering.differs;

    let (key, handle) = sessions.put(new_session(post, rendering, mode, chat_id));

    match &post.primary {
        PrimaryMedia::Video(video) => {
            let sent = bot
                .send_video(chat_id, input_file(video))
                .caption(caption)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboard::video_keyboard(&key, mode, has_translation))
                .await?;

            let mut session = handle.lock().await;
            session.video_file_id = sent.video().map(|v| v.file.id.clone());
            session.media_message_id = Some(sent.id);
        }
        PrimaryMedia::Photo(photo) => {
            let sent = bot
                .send_photo(chat_id, input_file(photo))
                .caption(caption)
                .parse_mode(ParseMode::Html)
                .await?;

            let options = bot
                .send_message(chat_id, "Опції:")
                .reply_markup(keyboard::photo_keyboard(&key, mode, has_translation))
                .await?;

            let mut session = handle.lock().await;
            session.media_message_id = Some(sent.id);
            session.caption_message_id = Some(options.id);
        }
        PrimaryMedia::Gallery(assets) => {
            send_album(bot, chat_id, assets).await?;

            // Album captions cannot be edited after the fact, so the caption
            // rides on a standalone message together with the keyboard.
            let caption_msg = bot
                .send_message(chat_id, caption)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboard::photo_keyboard(&key, mode, has_translation))
                .await?;

            let mut session = handle.lock().await;
            session.caption_message_id = Some(caption_msg.id);
        }
    }

    send_trailing_audio(bot, chat_id, post).await;

    Ok(())
}

/// Re-delivers retained media without caption or keyboard. Returns `false`
/// when the session kept nothing to resend.
pub async fn resend_retained_clean(bot: &Throttle<Bot>, chat_id: ChatId, session: &PostSession) -> BotResult<bool> {
    if let Some(photo) = &session.photo {
        bot.send_photo(chat_id, input_file(photo)).await?;
        return Ok(true);
    }

    if !session.gallery.is_empty() {
        send_album(bot, chat_id, &session.gallery).await?;
        return Ok(true);
    }

    Ok(false)
}
