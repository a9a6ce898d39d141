use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;

use super::{fetch_bytes, fetch_gallery, MediaAsset, MediaKind, PrimaryMedia, ResolveStrategy, ResolvedPost, StrategyError};
use crate::utils::sanitize_filename;

const TIKWM_ENDPOINT: &str = "https://www.tikwm.com/api/";

// A crawler UA gets the short-link redirect without a consent interstitial.
const REDIRECT_UA: &str = "facebookexternalhit/1.1 (+http://www.facebook.com/externalhit_uatext.php)";

const RETRY_DELAY: Duration = Duration::from_millis(1100);

#[derive(Debug, Deserialize)]
struct TikwmResponse {
    #[serde(default)]
    msg: String,
    data: Option<TikwmData>,
}

#[derive(Debug, Deserialize)]
struct TikwmData {
    author: TikwmAuthor,
    #[serde(default)]
    title: String,
    #[serde(default)]
    music: Option<String>,
    #[serde(default)]
    music_info: Option<TikwmMusic>,
    #[serde(default)]
    images: Option<Vec<String>>,
    #[serde(default)]
    hdplay: Option<String>,
    #[serde(default)]
    play: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TikwmAuthor {
    #[serde(default)]
    nickname: String,
    #[serde(default)]
    unique_id: String,
}

#[derive(Debug, Deserialize)]
struct TikwmMusic {
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, PartialEq)]
enum TikwmMedia {
    Images(Vec<String>),
    Video(String),
}

fn is_rate_limit_msg(msg: &str) -> bool {
    msg.contains("Free Api Limit") || msg.contains("Url parsing is failed")
}

fn validate(response: TikwmResponse) -> Result<TikwmData, StrategyError> {
    match response.data {
        Some(data) => Ok(data),
        None if is_rate_limit_msg(&response.msg) => Err(StrategyError::RateLimited(response.msg)),
        None => Err(StrategyError::Payload(format!("tikwm: {}", response.msg))),
    }
}

fn select_media(data: &TikwmData) -> Option<TikwmMedia> {
    if let Some(images) = data.images.as_ref().filter(|urls| !urls.is_empty()) {
        return Some(TikwmMedia::Images(images.clone()));
    }

    data.hdplay
        .clone()
        .filter(|url| !url.is_empty())
        .or_else(|| data.play.clone().filter(|url| !url.is_empty()))
        .map(TikwmMedia::Video)
}

fn audio_file_name(data: &TikwmData) -> String {
    let (author, title) = match &data.music_info {
        Some(info) => (
            info.author.clone().unwrap_or_else(|| data.author.nickname.clone()),
            info.title.clone().unwrap_or_else(|| "Audio".to_string()),
        ),
        None => (data.author.nickname.clone(), "Audio".to_string()),
    };

    format!("{} - {}.mp3", sanitize_filename(&author), sanitize_filename(&title))
}

pub struct TikwmStrategy {
    api_client: Client,
    media_client: Client,
}

impl TikwmStrategy {
    pub fn new(api_client: Client, media_client: Client) -> Self {
        Self { api_client, media_client }
    }

    /// Short vm./vt. links hide the canonical URL behind a redirect.
    async fn expand_short_url(&self, url: &str) -> String {
        if !url.contains("vm.tiktok.com") && !url.contains("vt.tiktok.com") {
            return url.to_string();
        }

        match self
            .api_client
            .get(url)
            .header(header::USER_AGENT, REDIRECT_UA)
            .send()
            .await
        {
            Ok(resp) => resp.url().to_string(),
            Err(e) => {
                warn!("Short-link expansion failed for {}: {}", url, e);
                url.to_string()
            }
        }
    }

    async fn query_api(&self, url: &str) -> Result<TikwmData, StrategyError> {
        let response = self
            .api_client
            .post(TIKWM_ENDPOINT)
            .form(&[("url", url), ("hd", "1")])
            .send()
            .await?
            .json::<TikwmResponse>()
            .await
            .map_err(|e| StrategyError::Payload(format!("tikwm body: {}", e)))?;

        validate(response)
    }
}

#[async_trait]
impl ResolveStrategy for TikwmStrategy {
    fn name(&self) -> &'static str {
        "tikwm-api"
    }

    async fn attempt(&self, url: &str) -> Result<ResolvedPost, StrategyError> {
        let full_url = self.expand_short_url(url).await;
        let full_url = full_url.split('?').next().unwrap_or(&full_url).to_string();

        let data = match self.query_api(&full_url).await {
            Err(StrategyError::RateLimited(msg)) => {
                warn!("tikwm rate limited ({}), retrying once", msg);
                tokio::time::sleep(RETRY_DELAY).await;
                self.query_api(&full_url).await?
            }
            other => other?,
        };

        let author_name = if data.author.nickname.is_empty() {
            data.author.unique_id.clone()
        } else {
            data.author.nickname.clone()
        };
        let author_url = format!("https://www.tiktok.com/@{}", data.author.unique_id);
        let audio_name = audio_file_name(&data);

        let detached_audio = match &data.music {
            Some(music_url) => fetch_bytes(&self.media_client, music_url)
                .await
                .map(|bytes| MediaAsset::audio(bytes, audio_name.clone())),
            None => None,
        };

        let primary = match select_media(&data).ok_or(StrategyError::NoMedia)? {
            TikwmMedia::Images(urls) => {
                let items: Vec<(String, MediaKind)> =
                    urls.into_iter().map(|url| (url, MediaKind::Photo)).collect();
                let assets = fetch_gallery(&self.media_client, &items).await;
                if assets.is_empty() {
                    return Err(StrategyError::Payload("all gallery downloads failed".to_string()));
                }
                PrimaryMedia::Gallery(assets)
            }
            TikwmMedia::Video(video_url) => {
                let bytes = fetch_bytes(&self.media_client, &video_url)
                    .await
                    .ok_or_else(|| StrategyError::Payload("video download failed".to_string()))?;
                PrimaryMedia::Video(MediaAsset::video(bytes))
            }
        };

        Ok(ResolvedPost {
            source_url: full_url,
            author_name,
            author_url,
            raw_caption: data.title.clone(),
            primary,
            detached_audio,
            audio_file_name: audio_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_recognizes_rate_limit_signatures() {
        let limited: TikwmResponse =
            serde_json::from_str(r#"{"code": -1, "msg": "Free Api Limit: 1 request/second"}"#).unwrap();
        assert!(matches!(validate(limited), Err(StrategyError::RateLimited(_))));

        let parse_failed: TikwmResponse =
            serde_json::from_str(r#"{"code": -1, "msg": "Url parsing is failed! Please check url."}"#).unwrap();
        assert!(matches!(validate(parse_failed), Err(StrategyError::RateLimited(_))));

        let other: TikwmResponse = serde_json::from_str(r#"{"code": -1, "msg": "Video is private"}"#).unwrap();
        assert!(matches!(validate(other), Err(StrategyError::Payload(_))));
    }

    #[test]
    fn validate_accepts_payload_with_data() {
        let ok: TikwmResponse = serde_json::from_str(
            r#"{
                "code": 0,
                "msg": "success",
                "data": {
                    "title": "first dance",
                    "hdplay": "https://cdn.example/video_hd.mp4",
                    "play": "https://cdn.example/video.mp4",
                    "music": "https://cdn.example/sound.mp3",
                    "music_info": {"author": "DJ Bee", "title": "Loop"},
                    "author": {"nickname": "Alice", "unique_id": "alice01"}
                }
            }"#,
        )
        .unwrap();

        let data = validate(ok).unwrap();
        assert_eq!(data.title, "first dance");
        assert_eq!(data.author.unique_id, "alice01");
        assert_eq!(select_media(&data), Some(TikwmMedia::Video("https://cdn.example/video_hd.mp4".into())));
        assert_eq!(audio_file_name(&data), "DJ Bee - Loop.mp3");
    }

    #[test]
    fn photo_mode_posts_select_the_image_list() {
        let data: TikwmData = serde_json::from_str(
            r#"{
                "title": "",
                "images": ["https://cdn.example/1.jpg", "https://cdn.example/2.jpg"],
                "author": {"nickname": "Alice", "unique_id": "alice01"}
            }"#,
        )
        .unwrap();

        match select_media(&data) {
            Some(TikwmMedia::Images(urls)) => assert_eq!(urls.len(), 2),
            other => panic!("expected image list, got {:?}", other),
        }
    }

    #[test]
    fn posts_without_media_urls_select_nothing() {
        let data: TikwmData = serde_json::from_str(
            r#"{"title": "x", "author": {"nickname": "A", "unique_id": "a"}}"#,
        )
        .unwrap();
        assert_eq!(select_media(&data), None);

        let music_fallback_name = audio_file_name(&data);
        assert_eq!(music_fallback_name, "A - Audio.mp3");
    }
}
