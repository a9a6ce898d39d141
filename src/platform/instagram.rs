use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::{fetch_bytes, fetch_gallery, MediaAsset, MediaKind, PrimaryMedia, ResolveStrategy, ResolvedPost, StrategyError};

const GRAPH_ENDPOINT: &str = "https://www.instagram.com/graphql/query";

static SHORTCODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(p|reel|reels)/([A-Za-z0-9_\-]+)").unwrap());

fn extract_shortcode(url: &str) -> Option<&str> {
    SHORTCODE_REGEX.captures(url).and_then(|c| c.get(2)).map(|m| m.as_str())
}

#[derive(Debug, PartialEq)]
enum GraphMedia {
    Single { url: String, kind: MediaKind },
    Sidecar(Vec<(String, MediaKind)>),
}

#[derive(Debug, PartialEq)]
struct GraphPost {
    username: String,
    caption: String,
    media: GraphMedia,
}

/// Largest rendition wins; `display_resources` is ordered smallest first.
fn find_display_url(node: &Value) -> Option<String> {
    node.get("display_resources")
        .and_then(|r| r.as_array())
        .and_then(|r| r.last())
        .and_then(|r| r.get("src"))
        .and_then(|s| s.as_str())
        .or_else(|| node.get("display_url").and_then(|u| u.as_str()))
        .map(|s| s.to_string())
}

fn parse_node(node: &Value) -> Result<(String, MediaKind), StrategyError> {
    let is_video = node.get("is_video").and_then(|v| v.as_bool()).unwrap_or(false);

    if is_video {
        let url = node
            .get("video_url")
            .and_then(|u| u.as_str())
            .ok_or_else(|| StrategyError::Payload("missing video_url".to_string()))?;
        Ok((url.to_string(), MediaKind::Video))
    } else {
        let url = find_display_url(node).ok_or_else(|| StrategyError::Payload("missing display url".to_string()))?;
        Ok((url, MediaKind::Photo))
    }
}

fn parse_graph_response(data: &Value) -> Result<GraphPost, StrategyError> {
    if data.get("require_login").and_then(|v| v.as_bool()).unwrap_or(false) {
        return Err(StrategyError::LoginRequired);
    }

    let media = data
        .get("data")
        .and_then(|d| d.get("xdt_shortcode_media"))
        .ok_or_else(|| StrategyError::Payload("missing xdt_shortcode_media".to_string()))?;

    let typename = media
        .get("__typename")
        .and_then(|t| t.as_str())
        .ok_or_else(|| StrategyError::Payload("missing __typename".to_string()))?;

    let username = media
        .get("owner")
        .and_then(|o| o.get("username"))
        .and_then(|u| u.as_str())
        .unwrap_or("Instagram")
        .to_string();

    // Only the first caption line survives; the rest is hashtag noise.
    let caption = media
        .get("edge_media_to_caption")
        .and_then(|e| e.get("edges"))
        .and_then(|e| e.as_array())
        .and_then(|edges| edges.first())
        .and_then(|edge| edge.get("node"))
        .and_then(|node| node.get("text"))
        .and_then(|t| t.as_str())
        .map(|t| t.lines().next().unwrap_or("").to_string())
        .unwrap_or_default();

    let media = match typename {
        "XDTGraphSidecar" | "GraphSidecar" => {
            let edges = media
                .get("edge_sidecar_to_children")
                .and_then(|e| e.get("edges"))
                .and_then(|e| e.as_array())
                .ok_or_else(|| StrategyError::Payload("missing sidecar edges".to_string()))?;

            let mut items = Vec::with_capacity(edges.len());
            for edge in edges {
                let node = edge
                    .get("node")
                    .ok_or_else(|| StrategyError::Payload("missing sidecar node".to_string()))?;
                items.push(parse_node(node)?);
            }

            if items.is_empty() {
                return Err(StrategyError::NoMedia);
            }

            GraphMedia::Sidecar(items)
        }
        "XDTGraphVideo" | "GraphVideo" => {
            let url = media
                .get("video_url")
                .and_then(|u| u.as_str())
                .ok_or_else(|| StrategyError::Payload("missing video_url".to_string()))?;
            GraphMedia::Single {
                url: url.to_string(),
                kind: MediaKind::Video,
            }
        }
        "XDTGraphImage" | "GraphImage" => {
            let url =
                find_display_url(media).ok_or_else(|| StrategyError::Payload("missing display url".to_string()))?;
            GraphMedia::Single {
                url,
                kind: MediaKind::Photo,
            }
        }
        other => return Err(StrategyError::Payload(format!("unsupported media type {}", other))),
    };

    Ok(GraphPost {
        username,
        caption,
        media,
    })
}

/// The public GraphQL document endpoint; the richest source (real caption,
/// per-node video flags), but the first to hide behind a login wall.
pub struct GraphApiStrategy {
    doc_id: String,
    api_client: Client,
    media_client: Client,
}

impl GraphApiStrategy {
    pub fn new(doc_id: String, api_client: Client, media_client: Client) -> Self {
        Self {
            doc_id,
            api_client,
            media_client,
        }
    }
}

#[async_trait]
impl ResolveStrategy for GraphApiStrategy {
    fn name(&self) -> &'static str {
        "instagram-graph"
    }

    async fn attempt(&self, url: &str) -> Result<ResolvedPost, StrategyError> {
        let shortcode = extract_shortcode(url)
            .ok_or_else(|| StrategyError::UnsupportedUrl(format!("no shortcode in {}", url)))?;

        let body = serde_json::json!({
            "doc_id": self.doc_id,
            "variables": { "shortcode": shortcode }
        });

        let response = self.api_client.post(GRAPH_ENDPOINT).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(StrategyError::Payload(format!(
                "instagram returned status {}",
                response.status()
            )));
        }

        let data = response
            .json::<Value>()
            .await
            .map_err(|e| StrategyError::Payload(format!("instagram body: {}", e)))?;

        let post = parse_graph_response(&data)?;

        let author_url = format!("https://instagram.com/{}", post.username);
        let audio_file_name = format!("{}.mp3", crate::utils::sanitize_filename(&post.username));

        let primary = match post.media {
            GraphMedia::Single { url: media_url, kind } => {
                let bytes = fetch_bytes(&self.media_client, &media_url)
                    .await
                    .ok_or_else(|| StrategyError::Payload("media download failed".to_string()))?;
                match kind {
                    MediaKind::Video => PrimaryMedia::Video(MediaAsset::video(bytes)),
                    _ => PrimaryMedia::Photo(MediaAsset::photo(bytes)),
                }
            }
            GraphMedia::Sidecar(items) => {
                let assets = fetch_gallery(&self.media_client, &items).await;
                if assets.is_empty() {
                    return Err(StrategyError::Payload("all gallery downloads failed".to_string()));
                }
                PrimaryMedia::Gallery(assets)
            }
        };

        Ok(ResolvedPost {
            source_url: url.to_string(),
            author_name: post.username,
            author_url,
            raw_caption: post.caption,
            primary,
            detached_audio: None,
            audio_file_name,
        })
    }
}

// ------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ProxyResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    picker: Option<Vec<ProxyPickerItem>>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProxyPickerItem {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    url: String,
}

fn kind_from_url(url: &str) -> MediaKind {
    if url.contains(".mp4") {
        MediaKind::Video
    } else {
        MediaKind::Photo
    }
}

fn parse_proxy_response(response: ProxyResponse) -> Result<Vec<(String, MediaKind)>, StrategyError> {
    match response.status.as_str() {
        "stream" | "redirect" | "tunnel" => {
            let url = response
                .url
                .filter(|u| !u.is_empty())
                .ok_or_else(|| StrategyError::Payload("proxy response missing url".to_string()))?;
            let kind = kind_from_url(&url);
            Ok(vec![(url, kind)])
        }
        "picker" => {
            let items: Vec<(String, MediaKind)> = response
                .picker
                .unwrap_or_default()
                .into_iter()
                .filter(|item| !item.url.is_empty())
                .map(|item| {
                    let kind = if item.kind == "video" || item.kind == "gif" {
                        MediaKind::Video
                    } else {
                        MediaKind::Photo
                    };
                    (item.url, kind)
                })
                .collect();

            if items.is_empty() {
                return Err(StrategyError::NoMedia);
            }
            Ok(items)
        }
        other => Err(StrategyError::Payload(format!(
            "proxy status {}: {}",
            other,
            response.text.unwrap_or_default()
        ))),
    }
}

/// Degraded fallback: a generic resolver proxy that only knows media URLs.
/// Author identity collapses to a placeholder and the caption is lost.
pub struct EmbedProxyStrategy {
    endpoint: String,
    api_client: Client,
    media_client: Client,
}

impl EmbedProxyStrategy {
    pub fn new(endpoint: String, api_client: Client, media_client: Client) -> Self {
        Self {
            endpoint,
            api_client,
            media_client,
        }
    }
}

#[async_trait]
impl ResolveStrategy for EmbedProxyStrategy {
    fn name(&self) -> &'static str {
        "embed-proxy"
    }

    async fn attempt(&self, url: &str) -> Result<ResolvedPost, StrategyError> {
        let response = self
            .api_client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await?
            .json::<ProxyResponse>()
            .await
            .map_err(|e| StrategyError::Payload(format!("proxy body: {}", e)))?;

        let items = parse_proxy_response(response)?;

        let primary = if items.len() == 1 {
            let (media_url, kind) = items.into_iter().next().expect("len checked");
            let bytes = fetch_bytes(&self.media_client, &media_url)
                .await
                .ok_or_else(|| StrategyError::Payload("media download failed".to_string()))?;
            match kind {
                MediaKind::Video => PrimaryMedia::Video(MediaAsset::video(bytes)),
                _ => PrimaryMedia::Photo(MediaAsset::photo(bytes)),
            }
        } else {
            let assets = fetch_gallery(&self.media_client, &items).await;
            if assets.is_empty() {
                return Err(StrategyError::Payload("all gallery downloads failed".to_string()));
            }
            PrimaryMedia::Gallery(assets)
        };

        Ok(ResolvedPost {
            source_url: url.to_string(),
            author_name: "Instagram".to_string(),
            author_url: url.to_string(),
            raw_caption: String::new(),
            primary,
            detached_audio: None,
            audio_file_name: "audio.mp3".to_string(),
        })
    }
}
