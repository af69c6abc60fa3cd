//! Album artwork resolution
//!
//! Resolves artwork once per artist/album pair: the deterministic cache id
//! doubles as the dedup key, and an in-process once-cell per pair collapses
//! concurrent requests so enrichment batches never fetch the same cover
//! twice. Artwork failures are soft; resolution yields `None` instead of
//! erroring.

use crate::providers::AlbumArtSource;
use core_cache::store::{album_art_id, ContentStore};
use core_library::{UNKNOWN_ALBUM, UNKNOWN_ARTIST};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

/// Deduplicating artwork resolver over a provider and the content store.
pub struct ArtworkResolver {
    store: Arc<ContentStore>,
    source: Arc<dyn AlbumArtSource>,
    resolved: Mutex<HashMap<String, Arc<OnceCell<Option<String>>>>>,
}

impl ArtworkResolver {
    pub fn new(store: Arc<ContentStore>, source: Arc<dyn AlbumArtSource>) -> Self {
        Self {
            store,
            source,
            resolved: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves artwork for an artist/album pair, returning the cache id of
    /// the stored image, or `None` when the pair is unidentified, the
    /// provider has nothing, or fetching fails.
    pub async fn resolve(&self, artist: &str, album: &str) -> Option<String> {
        if !identified(artist, UNKNOWN_ARTIST) || !identified(album, UNKNOWN_ALBUM) {
            return None;
        }

        let id = album_art_id(artist, album);

        let cell = {
            let mut resolved = self.resolved.lock().await;
            Arc::clone(resolved.entry(id.clone()).or_default())
        };

        cell.get_or_init(|| self.fetch(artist, album, id))
            .await
            .clone()
    }

    async fn fetch(&self, artist: &str, album: &str, id: String) -> Option<String> {
        if self.store.exists(&id).await {
            debug!(id = %id, "Artwork already cached");
            return Some(id);
        }

        let url = match self.source.art_url(artist, album).await {
            Ok(Some(url)) => url,
            Ok(None) => return None,
            Err(e) => {
                warn!(artist = artist, album = album, error = %e, "Artwork lookup failed");
                return None;
            }
        };

        match self.store.download_and_store(&url, &id).await {
            Ok(stored) => Some(stored),
            Err(e) => {
                warn!(id = %id, error = %e, "Artwork download failed");
                None
            }
        }
    }
}

fn identified(name: &str, sentinel: &str) -> bool {
    !name.trim().is_empty() && name != sentinel
}
