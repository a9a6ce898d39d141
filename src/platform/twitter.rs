use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

use super::{fetch_bytes, fetch_gallery, MediaAsset, MediaKind, PrimaryMedia, ResolveStrategy, ResolvedPost, StrategyError};

static STATUS_ID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"/status/(\d+)").unwrap());

#[derive(Debug, Deserialize)]
struct MirrorTweet {
    #[serde(default)]
    user_name: String,
    #[serde(default)]
    user_screen_name: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    media_extended: Vec<MirrorMedia>,
    #[serde(default, rename = "mediaURLs")]
    media_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MirrorMedia {
    #[serde(rename = "type")]
    #[serde(default)]
    kind: String,
    #[serde(default)]
    url: String,
}

fn extract_status_id(url: &str) -> Option<&str> {
    STATUS_ID_REGEX.captures(url).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// A tweet's video or gif, if any, wins over its photos; otherwise every
/// photo becomes a gallery item in declared order.
fn select_media(tweet: &MirrorTweet) -> Result<MirrorSelection, StrategyError> {
    if let Some(video) = tweet
        .media_extended
        .iter()
        .find(|m| m.kind == "video" || m.kind == "gif")
    {
        return Ok(MirrorSelection::Video(video.url.clone()));
    }

    let photos: Vec<String> = if tweet.media_extended.is_empty() {
        tweet.media_urls.clone()
    } else {
        tweet
            .media_extended
            .iter()
            .filter(|m| m.kind == "image")
            .map(|m| m.url.clone())
            .collect()
    };

    if photos.is_empty() {
        return Err(StrategyError::NoMedia);
    }

    Ok(MirrorSelection::Photos(photos))
}

#[derive(Debug, PartialEq)]
enum MirrorSelection {
    Video(String),
    Photos(Vec<String>),
}

/// One mirror API host serving the vxtwitter JSON shape. Several hosts run
/// the same software, so the chain lists this strategy more than once with
/// different hosts.
pub struct MirrorApiStrategy {
    host: &'static str,
    api_client: Client,
    media_client: Client,
}

impl MirrorApiStrategy {
    pub fn new(host: &'static str, api_client: Client, media_client: Client) -> Self {
        Self {
            host,
            api_client,
            media_client,
        }
    }
}

#[async_trait]
impl ResolveStrategy for MirrorApiStrategy {
    fn name(&self) -> &'static str {
        self.host
    }

    async fn attempt(&self, url: &str) -> Result<ResolvedPost, StrategyError> {
        let status_id = extract_status_id(url)
            .ok_or_else(|| StrategyError::UnsupportedUrl(format!("no status id in {}", url)))?;

        let api_url = format!("https://{}/Twitter/status/{}", self.host, status_id);

        let response = self.api_client.get(&api_url).send().await?;
        if !response.status().is_success() {
            return Err(StrategyError::Payload(format!(
                "{} returned status {}",
                self.host,
                response.status()
            )));
        }

        let tweet = response
            .json::<MirrorTweet>()
            .await
            .map_err(|e| StrategyError::Payload(format!("{} body: {}", self.host, e)))?;

        let author_name = if tweet.user_name.is_empty() {
            "User".to_string()
        } else {
            tweet.user_name.clone()
        };
        let screen_name = if tweet.user_screen_name.is_empty() {
            "user".to_string()
        } else {
            tweet.user_screen_name.clone()
        };

        let primary = match select_media(&tweet)? {
            MirrorSelection::Video(video_url) => {
                let bytes = fetch_bytes(&self.media_client, &video_url)
                    .await
                    .ok_or_else(|| StrategyError::Payload("video download failed".to_string()))?;
                PrimaryMedia::Video(MediaAsset::video(bytes))
            }
            MirrorSelection::Photos(urls) => {
                let items: Vec<(String, MediaKind)> =
                    urls.into_iter().map(|u| (u, MediaKind::Photo)).collect();
                let assets = fetch_gallery(&self.media_client, &items).await;
                match assets.len() {
                    0 => return Err(StrategyError::Payload("all gallery downloads failed".to_string())),
                    1 => PrimaryMedia::Photo(assets.into_iter().next().expect("len checked")),
                    _ => PrimaryMedia::Gallery(assets),
                }
            }
        };

        Ok(ResolvedPost {
            source_url: url.to_string(),
            author_name: author_name.clone(),
            author_url: format!("https://x.com/{}", screen_name),
            raw_caption: tweet.text.clone(),
            primary,
            detached_audio: None,
            audio_file_name: format!("{} - twitter.mp3", crate::utils::sanitize_filename(&author_name)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_id_extraction() {
        assert_eq!(
            extract_status_id("https://x.com/alice/status/1234567890"),
            Some("1234567890")
        );
        assert_eq!(
            extract_status_id("https://twitter.com/alice/status/42?s=20"),
            Some("42")
        );
        assert_eq!(extract_status_id("https://x.com/alice"), None);
    }

    #[test]
    fn video_wins_over_photos() {
        let tweet: MirrorTweet = serde_json::from_str(
            r#"{
                "user_name": "Alice",
                "user_screen_name": "alice",
                "text": "mira esto",
                "media_extended": [
                    {"type": "image", "url": "https://pbs.example/a.jpg"},
                    {"type": "video", "url": "https://video.example/v.mp4"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(
            select_media(&tweet).unwrap(),
            MirrorSelection::Video("https://video.example/v.mp4".into())
        );
    }

    #[test]
    fn photos_keep_declared_order() {
        let tweet: MirrorTweet = serde_json::from_str(
            r#"{
                "user_name": "Alice",
                "user_screen_name": "alice",
                "text": "",
                "media_extended": [
                    {"type": "image", "url": "https://pbs.example/1.jpg"},
                    {"type": "image", "url": "https://pbs.example/2.jpg"},
                    {"type": "image", "url": "https://pbs.example/3.jpg"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(
            select_media(&tweet).unwrap(),
            MirrorSelection::Photos(vec![
                "https://pbs.example/1.jpg".into(),
                "https://pbs.example/2.jpg".into(),
                "https://pbs.example/3.jpg".into(),
            ])
        );
    }

    #[test]
    fn legacy_media_urls_field_is_a_fallback() {
        let tweet: MirrorTweet = serde_json::from_str(
            r#"{"user_name": "A", "user_screen_name": "a", "text": "", "mediaURLs": ["https://pbs.example/only.jpg"]}"#,
        )
        .unwrap();

        assert_eq!(
            select_media(&tweet).unwrap(),
            MirrorSelection::Photos(vec!["https://pbs.example/only.jpg".into()])
        );
    }

    #[test]
    fn tweets_without_media_are_no_media() {
        let tweet: MirrorTweet =
            serde_json::from_str(r#"{"user_name": "A", "user_screen_name": "a", "text": "hi"}"#).unwrap();
        assert!(matches!(select_media(&tweet), Err(StrategyError::NoMedia)));
    }
}
