use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::service::caption::LangMode;

/// Keyboard under a delivered video: audio / clean video, plus a language
/// toggle when a translation actually differs from the original.
pub fn video_keyboard(key: &str, current: LangMode, has_translation: bool) -> InlineKeyboardMarkup {
    let mut rows = vec![vec![
        InlineKeyboardButton::callback("🎵 Аудіо", format!("vid_audio:{}", key)),
        InlineKeyboardButton::callback("🎬 Відео", format!("vid_clean:{}", key)),
    ]];

    if has_translation {
        rows.push(vec![lang_toggle_button("vid_lang", key, current)]);
    }

    InlineKeyboardMarkup::new(rows)
}

/// Keyboard for photo and gallery posts, carried by the standalone
/// caption/options message.
pub fn photo_keyboard(key: &str, current: LangMode, has_translation: bool) -> InlineKeyboardMarkup {
    let mut rows = vec![vec![InlineKeyboardButton::callback(
        "🖼️ Тільки медіа",
        format!("pho_clean:{}", key),
    )]];

    if has_translation {
        rows.push(vec![lang_toggle_button("pho_lang", key, current)]);
    }

    InlineKeyboardMarkup::new(rows)
}

fn lang_toggle_button(action: &str, key: &str, current: LangMode) -> InlineKeyboardButton {
    let target = current.flipped();
    let label = match target {
        LangMode::Translated => "🇺🇦 Переклад",
        LangMode::Original => "🌐 Оригінал",
    };

    InlineKeyboardButton::callback(label, format!("{}:{}:{}", action, target.callback_param(), key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    fn callback_data(button: &InlineKeyboardButton) -> &str {
        match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => data,
            other => panic!("expected callback button, got {:?}", other),
        }
    }

    #[test]
    fn video_keyboard_carries_the_session_key() {
        let kb = video_keyboard("AB12CD34", LangMode::Original, true);

        assert_eq!(kb.inline_keyboard.len(), 2);
        assert_eq!(callback_data(&kb.inline_keyboard[0][0]), "vid_audio:AB12CD34");
        assert_eq!(callback_data(&kb.inline_keyboard[0][1]), "vid_clean:AB12CD34");
        assert_eq!(callback_data(&kb.inline_keyboard[1][0]), "vid_lang:trans:AB12CD34");
    }

    #[test]
    fn toggle_button_targets_the_other_language() {
        let kb = video_keyboard("k", LangMode::Translated, true);
        assert_eq!(callback_data(&kb.inline_keyboard[1][0]), "vid_lang:orig:k");
        assert_eq!(kb.inline_keyboard[1][0].text, "🌐 Оригінал");
    }

    #[test]
    fn no_toggle_row_without_a_differing_translation() {
        let kb = video_keyboard("k", LangMode::Original, false);
        assert_eq!(kb.inline_keyboard.len(), 1);

        let kb = photo_keyboard("k", LangMode::Original, false);
        assert_eq!(kb.inline_keyboard.len(), 1);
        assert_eq!(callback_data(&kb.inline_keyboard[0][0]), "pho_clean:k");
    }

    #[test]
    fn photo_keyboard_toggle_uses_photo_action() {
        let kb = photo_keyboard("k", LangMode::Original, true);
        assert_eq!(callback_data(&kb.inline_keyboard[1][0]), "pho_lang:trans:k");
    }
}
