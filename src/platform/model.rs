use std::fmt;

use bytes::Bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
    Audio,
}

/// One retrievable unit of media, already downloaded.
#[derive(Clone)]
pub struct MediaAsset {
    pub bytes: Bytes,
    pub kind: MediaKind,
    pub file_name: String,
}

impl MediaAsset {
    pub fn photo(bytes: Bytes) -> Self {
        Self {
            bytes,
            kind: MediaKind::Photo,
            file_name: "photo.jpg".to_string(),
        }
    }

    pub fn video(bytes: Bytes) -> Self {
        Self {
            bytes,
            kind: MediaKind::Video,
            file_name: "video.mp4".to_string(),
        }
    }

    pub fn audio(bytes: Bytes, file_name: String) -> Self {
        Self {
            bytes,
            kind: MediaKind::Audio,
            file_name,
        }
    }
}

impl fmt::Debug for MediaAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaAsset")
            .field("kind", &self.kind)
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Exactly one of these shapes is delivered per post. A `Gallery` is never
/// empty; resolvers error out instead of returning an empty album.
#[derive(Debug, Clone)]
pub enum PrimaryMedia {
    Video(MediaAsset),
    Photo(MediaAsset),
    Gallery(Vec<MediaAsset>),
}

impl PrimaryMedia {
    pub fn is_video(&self) -> bool {
        matches!(self, PrimaryMedia::Video(_))
    }
}

/// The normalized output of every resolver strategy, regardless of which
/// third-party shape it came from.
#[derive(Debug, Clone)]
pub struct ResolvedPost {
    pub source_url: String,
    pub author_name: String,
    pub author_url: String,
    pub raw_caption: String,
    pub primary: PrimaryMedia,
    /// A soundtrack hosted separately from any video container (TikTok).
    pub detached_audio: Option<MediaAsset>,
    pub audio_file_name: String,
}
