use bytes::Bytes;
use futures_util::future::join_all;
use reqwest::Client;

use super::{MediaAsset, MediaKind};

/// Best-effort byte fetch. A failed asset download is reported as `None` and
/// must never abort the whole post; callers decide whether an empty result
/// set is an error.
pub async fn fetch_bytes(client: &Client, url: &str) -> Option<Bytes> {
    if url.is_empty() {
        return None;
    }

    match client.get(url).send().await {
        Ok(resp) if resp.status().is_success() => match resp.bytes().await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Failed to read body of {}: {}", url, e);
                None
            }
        },
        Ok(resp) => {
            warn!("Asset fetch {} returned status {}", url, resp.status());
            None
        }
        Err(e) => {
            warn!("Asset fetch {} failed: {}", url, e);
            None
        }
    }
}

/// Downloads gallery items concurrently and reassembles them in the
/// platform-declared order. Failed items are dropped silently; relative
/// order of the survivors is preserved.
pub async fn fetch_gallery(client: &Client, items: &[(String, MediaKind)]) -> Vec<MediaAsset> {
    let downloads = items.iter().map(|(url, kind)| {
        let kind = *kind;
        async move { fetch_bytes(client, url).await.map(|bytes| (bytes, kind)) }
    });

    join_all(downloads)
        .await
        .into_iter()
        .flatten()
        .map(|(bytes, kind)| match kind {
            MediaKind::Video => MediaAsset::video(bytes),
            _ => MediaAsset::photo(bytes),
        })
        .collect()
}
