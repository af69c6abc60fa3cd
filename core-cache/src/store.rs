//! Content store over the blob bridge
//!
//! Entries are addressed by stable ids: album artwork uses a deterministic
//! id derived from artist and album so repeated resolutions dedupe, while
//! downloaded audio gets a random id recorded in the catalog.

use crate::error::{CacheError, Result};
use bridge_traits::{
    blob::BlobStore,
    error::BridgeError,
    http::{HttpClient, HttpRequest},
};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Characters stripped from artist/album names when forming artwork ids.
const SANITIZED_CHARS: [char; 11] = ['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>', ' '];

/// Cached-content facade over [`BlobStore`] plus an HTTP fetch path.
pub struct ContentStore {
    blobs: Arc<dyn BlobStore>,
    http: Arc<dyn HttpClient>,
}

impl ContentStore {
    pub fn new(blobs: Arc<dyn BlobStore>, http: Arc<dyn HttpClient>) -> Self {
        Self { blobs, http }
    }

    /// Whether an entry exists in the cache. Never fails: a storage error
    /// is logged and reported as absent, so callers at worst re-fetch.
    pub async fn exists(&self, id: &str) -> bool {
        match self.blobs.contains(id).await {
            Ok(present) => present,
            Err(e) => {
                warn!(id = id, error = %e, "Cache existence check failed");
                false
            }
        }
    }

    /// Fetches `url` and stores the body under `id`. The id is returned
    /// only after the blob write succeeds, so a returned id is always
    /// backed by stored bytes.
    pub async fn download_and_store(&self, url: &str, id: &str) -> Result<String> {
        let response = self.http.execute(HttpRequest::get(url)).await?;

        if !response.is_success() {
            return Err(CacheError::Download {
                id: id.to_string(),
                reason: format!("HTTP {}", response.status),
            });
        }

        self.blobs.put(id, response.body).await?;
        debug!(id = id, "Cached content");
        Ok(id.to_string())
    }

    /// Reads a cached entry.
    pub async fn retrieve(&self, id: &str) -> Result<Bytes> {
        match self.blobs.get(id).await {
            Ok(data) => Ok(data),
            Err(BridgeError::NotFound(_)) => Err(CacheError::NotCached(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes a cached entry. Removing an absent entry succeeds.
    pub async fn delete(&self, id: &str) -> Result<()> {
        match self.blobs.remove(id).await {
            Ok(()) => Ok(()),
            Err(BridgeError::NotFound(_)) => {
                debug!(id = id, "Delete of absent cache entry");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fresh random id for a downloaded audio file.
    pub fn new_audio_id() -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic artwork id for an artist/album pair. Same pair, same id,
/// so artwork is stored once per album regardless of track count.
pub fn album_art_id(artist: &str, album: &str) -> String {
    format!(
        "art-{}-{}",
        sanitize(artist, "unknown_artist"),
        sanitize(album, "unknown_album")
    )
}

fn sanitize(name: &str, fallback: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .map(|c| if SANITIZED_CHARS.contains(&c) { '_' } else { c })
        .collect();

    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}
