use reqwest::Client;
use serde_json::Value;

const TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

#[derive(Debug, thiserror::Error)]
pub enum TranslationError {
    #[error("translation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected translation payload: {0}")]
    Payload(String),
}

/// Thin client for the unofficial web-translate endpoint. Responses are a
/// nested array; the first element lists translated segments.
#[derive(Clone)]
pub struct TranslationService {
    client: Client,
}

impl TranslationService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn translate(&self, text: &str, target_lang: &str) -> Result<String, TranslationError> {
        let response = self
            .client
            .get(TRANSLATE_ENDPOINT)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TranslationError::Payload(format!(
                "translator returned status {}",
                response.status()
            )));
        }

        let value = response.json::<Value>().await?;
        parse_translation(&value)
    }
}

fn parse_translation(value: &Value) -> Result<String, TranslationError> {
    let segments = value
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| TranslationError::Payload("missing segment list".to_string()))?;

    let mut out = String::new();
    for segment in segments {
        if let Some(part) = segment.get(0).and_then(|p| p.as_str()) {
            out.push_str(part);
        }
    }

    if out.is_empty() {
        return Err(TranslationError::Payload("empty translation".to_string()));
    }

    Ok(out)
}
