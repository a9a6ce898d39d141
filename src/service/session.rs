use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::distributions::Alphanumeric;
use rand::Rng;
use teloxide::types::{ChatId, MessageId};
use tokio::sync::Mutex;

use super::caption::{CaptionRendering, LangMode};
use crate::platform::MediaAsset;

const KEY_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Video,
    Photo,
    Gallery,
}

/// Everything a follow-up button press needs to reproduce or vary an
/// already-delivered post without a full re-resolve.
#[derive(Debug)]
pub struct PostSession {
    pub source_url: String,
    pub author_name: String,
    pub author_url: String,
    pub caption: CaptionRendering,
    pub lang_mode: LangMode,
    pub kind: SessionKind,
    pub chat_id: ChatId,
    /// Telegram-issued durable reference to the delivered video.
    pub video_file_id: Option<String>,
    pub photo: Option<MediaAsset>,
    pub gallery: Vec<MediaAsset>,
    pub audio: Option<MediaAsset>,
    pub audio_file_name: String,
    /// The single photo/video message whose caption gets edited in place.
    pub media_message_id: Option<MessageId>,
    /// The standalone caption/options message used by photo and gallery
    /// deliveries; galleries replace it wholesale on language toggle.
    pub caption_message_id: Option<MessageId>,
}

pub type SessionHandle = Arc<Mutex<PostSession>>;

struct StoredEntry {
    created_at: DateTime<Utc>,
    session: SessionHandle,
}

/// In-memory post-state cache. Entries expire after `ttl`; when the map is
/// full the oldest entry is evicted first. Entries are handed out behind a
/// per-session mutex so two rapid presses on the same post serialize
/// instead of racing across suspension points.
pub struct SessionStore {
    entries: DashMap<String, StoredEntry>,
    capacity: usize,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(capacity: usize, ttl_secs: i64) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    pub fn put(&self, session: PostSession) -> (String, SessionHandle) {
        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }

        let key = generate_key();
        let handle: SessionHandle = Arc::new(Mutex::new(session));
        self.entries.insert(
            key.clone(),
            StoredEntry {
                created_at: Utc::now(),
                session: Arc::clone(&handle),
            },
        );

        (key, handle)
    }

    pub fn get(&self, key: &str) -> Option<SessionHandle> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                if Utc::now() - entry.created_at < self.ttl {
                    return Some(Arc::clone(&entry.session));
                }
                true
            }
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }
        None
    }

    #[allow(dead_code)]
    pub fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now - entry.created_at < self.ttl);
        before - self.entries.len()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.created_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            debug!("Session store full, evicting {}", key);
            self.entries.remove(&key);
        }
    }
}

fn generate_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_session() -> PostSession {
        PostSession {
            source_url: "https://x.com/a/status/1".to_string(),
            author_name: "Alice".to_string(),
            author_url: "https://x.com/a".to_string(),
            caption: CaptionRendering {
                original: "hola".to_string(),
                translated: "привіт".to_string(),
                differs: true,
            },
            lang_mode: LangMode::Original,
            kind: SessionKind::Video,
            chat_id: ChatId(1),
            video_file_id: Some("file-id".to_string()),
            photo: None,
            gallery: Vec::new(),
            audio: None,
            audio_file_name: "Alice - twitter.mp3".to_string(),
            media_message_id: None,
            caption_message_id: None,
        }
    }

    #[tokio::test]
    async fn put_get_round_trip() {
        let store = SessionStore::new(10, 3600);
        let (key, _) = store.put(dummy_session());

        assert_eq!(key.len(), KEY_LEN);

        let handle = store.get(&key).expect("entry should be present");
        let session = handle.lock().await;
        assert_eq!(session.author_name, "Alice");
        assert_eq!(session.lang_mode, LangMode::Original);
    }

    #[tokio::test]
    async fn missing_and_expired_keys_are_none() {
        let store = SessionStore::new(10, 3600);
        assert!(store.get("nope1234").is_none());

        let expired = SessionStore::new(10, 0);
        let (key, _) = expired.put(dummy_session());
        assert!(expired.get(&key).is_none());
        // the expired entry is dropped on access
        assert_eq!(expired.len(), 0);
    }

    #[tokio::test]
    async fn capacity_evicts_before_insert() {
        let store = SessionStore::new(2, 3600);
        let (first, _) = store.put(dummy_session());
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let (_second, _) = store.put(dummy_session());
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let (third, _) = store.put(dummy_session());

        assert!(store.len() <= 2);
        assert!(store.get(&first).is_none(), "oldest entry should be evicted");
        assert!(store.get(&third).is_some());
    }

    #[tokio::test]
    async fn sweep_drops_expired_entries() {
        let store = SessionStore::new(10, 0);
        store.put(dummy_session());
        store.put(dummy_session());

        assert_eq!(store.sweep_expired(), 2);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn language_toggle_round_trips_on_an_entry() {
        let store = SessionStore::new(10, 3600);
        let (key, _) = store.put(dummy_session());

        let handle = store.get(&key).unwrap();
        let first_text = {
            let session = handle.lock().await;
            session.caption.text(session.lang_mode).to_string()
        };

        for _ in 0..2 {
            let handle = store.get(&key).unwrap();
            let mut session = handle.lock().await;
            session.lang_mode = session.lang_mode.flipped();
        }

        let session = handle.lock().await;
        assert_eq!(session.caption.text(session.lang_mode), first_text);
    }
}
