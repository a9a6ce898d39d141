use whatlang::Lang;

use super::translate::TranslationService;
use crate::config::CaptionConfig;

/// Both renderings of one caption, computed once per resolved post and
/// immutable afterwards. `differs` gates the translate/toggle button.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionRendering {
    pub original: String,
    pub translated: String,
    pub differs: bool,
}

impl CaptionRendering {
    pub fn empty() -> Self {
        Self {
            original: String::new(),
            translated: String::new(),
            differs: false,
        }
    }

    fn passthrough(text: &str) -> Self {
        Self {
            original: text.to_string(),
            translated: text.to_string(),
            differs: false,
        }
    }

    pub fn text(&self, mode: LangMode) -> &str {
        match mode {
            LangMode::Original => &self.original,
            LangMode::Translated => &self.translated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LangMode {
    Original,
    Translated,
}

impl LangMode {
    pub fn flipped(self) -> Self {
        match self {
            LangMode::Original => LangMode::Translated,
            LangMode::Translated => LangMode::Original,
        }
    }

    pub fn callback_param(self) -> &'static str {
        match self {
            LangMode::Original => "orig",
            LangMode::Translated => "trans",
        }
    }

    pub fn from_callback_param(param: &str) -> Option<Self> {
        match param {
            "orig" => Some(LangMode::Original),
            "trans" => Some(LangMode::Translated),
            _ => None,
        }
    }
}

/// Default policy: captions already in the pass-through language stay
/// untouched, everything else is translated into it. The invert flag flips
/// that, translating only pass-through captions (into the secondary
/// language) and leaving foreign ones alone.
pub fn translation_wanted(detected: Option<Lang>, pass_through: Lang, invert: bool) -> bool {
    // undetectable text is treated as already pass-through
    let is_pass_through = detected.map_or(true, |lang| lang == pass_through);
    if invert {
        is_pass_through
    } else {
        !is_pass_through
    }
}

fn detection_lang(code: &str) -> Lang {
    match code {
        "uk" => Lang::Ukr,
        "en" => Lang::Eng,
        "de" => Lang::Deu,
        "es" => Lang::Spa,
        "fr" => Lang::Fra,
        "it" => Lang::Ita,
        "pl" => Lang::Pol,
        "pt" => Lang::Por,
        "ru" => Lang::Rus,
        "tr" => Lang::Tur,
        other => {
            warn!("Unknown caption language {:?}, defaulting to uk", other);
            Lang::Ukr
        }
    }
}

#[derive(Clone)]
pub struct CaptionService {
    translator: TranslationService,
    pass_through: Lang,
    target_lang: String,
    secondary_lang: String,
}

impl CaptionService {
    pub fn new(translator: TranslationService, config: &CaptionConfig) -> Self {
        Self {
            translator,
            pass_through: detection_lang(&config.target_lang),
            target_lang: config.target_lang.clone(),
            secondary_lang: config.secondary_lang.clone(),
        }
    }

    pub async fn render(&self, raw_caption: &str, invert: bool) -> CaptionRendering {
        // the original text is copied verbatim; only emptiness looks at trim
        let raw = raw_caption;
        if raw.trim().is_empty() {
            return CaptionRendering::empty();
        }

        let detected = detect_language(raw.to_string()).await;

        if !translation_wanted(detected, self.pass_through, invert) {
            return CaptionRendering::passthrough(raw);
        }

        let target = if invert { &self.secondary_lang } else { &self.target_lang };

        match self.translator.translate(raw, target).await {
            Ok(translated) => {
                let differs = translated != raw;
                CaptionRendering {
                    original: raw.to_string(),
                    translated,
                    differs,
                }
            }
            Err(e) => {
                warn!("Translation failed, delivering original text: {}", e);
                CaptionRendering::passthrough(raw)
            }
        }
    }
}

/// Trigram detection is CPU-bound; keep it off the cooperative loop.
async fn detect_language(text: String) -> Option<Lang> {
    match tokio::task::spawn_blocking(move || whatlang::detect_lang(&text)).await {
        Ok(lang) => lang,
        Err(e) => {
            warn!("Language detection task failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::http;

    fn service() -> CaptionService {
        CaptionService::new(
            TranslationService::new(http::create_api_client()),
            &CaptionConfig {
                target_lang: "uk".to_string(),
                secondary_lang: "en".to_string(),
            },
        )
    }

    #[test]
    fn default_policy_translates_foreign_text_only() {
        assert!(translation_wanted(Some(Lang::Spa), Lang::Ukr, false));
        assert!(translation_wanted(Some(Lang::Eng), Lang::Ukr, false));
        assert!(!translation_wanted(Some(Lang::Ukr), Lang::Ukr, false));
        assert!(!translation_wanted(None, Lang::Ukr, false));
    }

    #[test]
    fn inverted_policy_translates_pass_through_text_only() {
        assert!(!translation_wanted(Some(Lang::Spa), Lang::Ukr, true));
        assert!(translation_wanted(Some(Lang::Ukr), Lang::Ukr, true));
        assert!(translation_wanted(None, Lang::Ukr, true));
    }

    #[tokio::test]
    async fn empty_caption_renders_empty_without_network() {
        let rendering = service().render("   \n ", false).await;
        assert_eq!(rendering, CaptionRendering::empty());
        assert!(!rendering.differs);
    }

    #[test]
    fn lang_mode_round_trips() {
        assert_eq!(LangMode::Original.flipped().flipped(), LangMode::Original);
        assert_eq!(LangMode::from_callback_param("trans"), Some(LangMode::Translated));
        assert_eq!(LangMode::from_callback_param("orig"), Some(LangMode::Original));
        assert_eq!(LangMode::from_callback_param("bogus"), None);
        assert_eq!(LangMode::Translated.callback_param(), "trans");
    }

    #[test]
    fn rendering_text_selection_round_trips() {
        let rendering = CaptionRendering {
            original: "hola".to_string(),
            translated: "привіт".to_string(),
            differs: true,
        };

        let mut mode = LangMode::Original;
        let first = rendering.text(mode).to_string();
        mode = mode.flipped();
        assert_eq!(rendering.text(mode), "привіт");
        mode = mode.flipped();
        assert_eq!(rendering.text(mode), first);
    }
}
