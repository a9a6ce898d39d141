use std::process::Stdio;

use bytes::Bytes;
use tokio::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ffmpeg exited with {0}")]
    Ffmpeg(std::process::ExitStatus),

    #[error("ffmpeg produced no audio")]
    EmptyOutput,
}

/// Audio extraction behind the external ffmpeg binary. Working files live in
/// a per-invocation temp directory that is removed when the guard drops,
/// success or not.
#[derive(Clone)]
pub struct Transcoder {
    bin: String,
}

impl Transcoder {
    pub fn new(bin: String) -> Self {
        Self { bin }
    }

    pub async fn extract_audio(&self, video: &[u8]) -> Result<Bytes, TranscodeError> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("input.mp4");
        let output = dir.path().join("audio.mp3");

        tokio::fs::write(&input, video).await?;

        let status = Command::new(&self.bin)
            .arg("-y")
            .arg("-i")
            .arg(&input)
            .args(["-vn", "-acodec", "libmp3lame", "-q:a", "2"])
            .arg(&output)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;

        if !status.success() {
            return Err(TranscodeError::Ffmpeg(status));
        }

        let bytes = tokio::fs::read(&output).await?;
        if bytes.is_empty() {
            return Err(TranscodeError::EmptyOutput);
        }

        Ok(bytes.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_an_io_error_not_a_panic() {
        let transcoder = Transcoder::new("postrelay-no-such-binary".to_string());
        let result = transcoder.extract_audio(b"not a real video").await;
        assert!(matches!(result, Err(TranscodeError::Io(_))));
    }
}
