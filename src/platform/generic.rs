use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use super::{MediaAsset, PrimaryMedia, ResolveStrategy, ResolvedPost, StrategyError};

/// Last-resort extractor shelling out to yt-dlp. Works on anything the tool
/// supports, but only ever yields a single merged video file with whatever
/// metadata the extractor reports.
pub struct YtDlpStrategy {
    bin: String,
}

impl YtDlpStrategy {
    pub fn new(bin: String) -> Self {
        Self { bin }
    }

    async fn probe_metadata(&self, url: &str) -> Result<Value, StrategyError> {
        let output = Command::new(&self.bin)
            .args(["--dump-json", "--no-download", "--no-warnings", "--no-playlist"])
            .arg(url)
            .output()
            .await
            .map_err(|e| StrategyError::Tool(format!("failed to run {}: {}", self.bin, e)))?;

        if !output.status.success() {
            return Err(StrategyError::Tool(format!(
                "{} probe failed: {}",
                self.bin,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| StrategyError::Tool(format!("{} metadata: {}", self.bin, e)))
    }
}

#[async_trait]
impl ResolveStrategy for YtDlpStrategy {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn attempt(&self, url: &str) -> Result<ResolvedPost, StrategyError> {
        let metadata = self.probe_metadata(url).await?;

        let dir = tempfile::tempdir().map_err(|e| StrategyError::Tool(format!("tempdir: {}", e)))?;
        let out_path = dir.path().join("media.mp4");

        let status = Command::new(&self.bin)
            .args(["--no-warnings", "--no-playlist", "-f", "mp4/bestvideo*+bestaudio/best", "-o"])
            .arg(&out_path)
            .arg(url)
            .status()
            .await
            .map_err(|e| StrategyError::Tool(format!("failed to run {}: {}", self.bin, e)))?;

        if !status.success() {
            return Err(StrategyError::Tool(format!("{} download exited with {}", self.bin, status)));
        }

        let bytes = tokio::fs::read(&out_path)
            .await
            .map_err(|e| StrategyError::Tool(format!("reading {}: {}", out_path.display(), e)))?;

        let author_name = metadata
            .get("uploader")
            .and_then(|u| u.as_str())
            .unwrap_or("User")
            .to_string();
        let author_url = metadata
            .get("uploader_url")
            .or_else(|| metadata.get("webpage_url"))
            .and_then(|u| u.as_str())
            .unwrap_or(url)
            .to_string();
        let raw_caption = metadata
            .get("title")
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(ResolvedPost {
            source_url: url.to_string(),
            author_name: author_name.clone(),
            author_url,
            raw_caption,
            primary: PrimaryMedia::Video(MediaAsset::video(bytes.into())),
            detached_audio: None,
            audio_file_name: format!("{}.mp3", crate::utils::sanitize_filename(&author_name)),
        })
    }
}
