//! Offline download manager
//!
//! Downloads audio into the content store and records local copies in the
//! catalog. The catalog is only updated after the bytes are safely stored,
//! and on deletion it keeps pointing at the entry until removal succeeds,
//! so `local_path` never references content that is not there.

use crate::error::{CacheError, Result};
use crate::store::ContentStore;
use bridge_traits::remote::ObjectCatalog;
use core_library::{Track, TrackCatalog};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

/// Coordinates audio downloads and deletions for offline playback.
pub struct DownloadManager {
    remote: Arc<dyn ObjectCatalog>,
    store: Arc<ContentStore>,
    catalog: Arc<TrackCatalog>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Removes the key from the in-flight set when dropped, including on
/// early return or task cancellation.
struct InFlightGuard {
    keys: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut keys) = self.keys.lock() {
            keys.remove(&self.key);
        }
    }
}

impl DownloadManager {
    pub fn new(
        remote: Arc<dyn ObjectCatalog>,
        store: Arc<ContentStore>,
        catalog: Arc<TrackCatalog>,
    ) -> Self {
        Self {
            remote,
            store,
            catalog,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    fn try_begin(&self, key: &str) -> Option<InFlightGuard> {
        let mut keys = self.in_flight.lock().ok()?;
        if !keys.insert(key.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            keys: Arc::clone(&self.in_flight),
            key: key.to_string(),
        })
    }

    /// Keys with a download currently in progress.
    pub fn in_flight_keys(&self) -> Vec<String> {
        self.in_flight
            .lock()
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Downloads one track for offline playback.
    ///
    /// Returns `Ok(true)` when a download happened, `Ok(false)` when the
    /// track was already cached or another download for the same key is
    /// still running.
    #[instrument(skip(self))]
    pub async fn download_track(&self, key: &str) -> Result<bool> {
        let mut track = self
            .catalog
            .get(key)
            .await?
            .ok_or_else(|| CacheError::TrackNotFound(key.to_string()))?;

        if let Some(ref id) = track.local_path {
            if self.store.exists(id).await {
                debug!(key = key, "Track already cached");
                return Ok(false);
            }
            // Stale pointer: content went missing, re-download under a new id.
            warn!(key = key, id = %id, "Cached entry missing, re-downloading");
        }

        let Some(_guard) = self.try_begin(key) else {
            debug!(key = key, "Download already in flight");
            return Ok(false);
        };

        let access = self.remote.access_url(key).await?;
        let id = ContentStore::new_audio_id();
        let stored_id = self.store.download_and_store(&access.url, &id).await?;

        track.local_path = Some(stored_id);
        self.catalog.upsert(track).await?;

        info!(key = key, "Downloaded track");
        Ok(true)
    }

    /// Removes a track's offline copy. A track with no local copy is a
    /// no-op; a failed removal leaves the catalog entry untouched.
    #[instrument(skip(self))]
    pub async fn delete_track(&self, key: &str) -> Result<()> {
        let mut track = self
            .catalog
            .get(key)
            .await?
            .ok_or_else(|| CacheError::TrackNotFound(key.to_string()))?;

        let Some(id) = track.local_path.take() else {
            return Ok(());
        };

        self.store.delete(&id).await?;
        self.catalog.upsert(track).await?;

        info!(key = key, "Removed offline copy");
        Ok(())
    }

    /// Downloads every track of an album. Individual failures are logged
    /// and skipped; returns the number of tracks newly downloaded.
    pub async fn download_album(&self, album_name: &str) -> Result<usize> {
        let tracks = self.album_tracks(album_name).await?;
        let mut downloaded = 0;

        for track in tracks {
            match self.download_track(&track.key).await {
                Ok(true) => downloaded += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(key = %track.key, error = %e, "Track download failed, continuing");
                }
            }
        }

        info!(album = album_name, downloaded = downloaded, "Album download finished");
        Ok(downloaded)
    }

    /// Removes offline copies for every track of an album. Individual
    /// failures are logged and skipped; returns the number removed.
    pub async fn delete_album(&self, album_name: &str) -> Result<usize> {
        let tracks = self.album_tracks(album_name).await?;
        let mut removed = 0;

        for track in tracks {
            if !track.is_downloaded() {
                continue;
            }
            match self.delete_track(&track.key).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!(key = %track.key, error = %e, "Track removal failed, continuing");
                }
            }
        }

        info!(album = album_name, removed = removed, "Album removal finished");
        Ok(removed)
    }

    async fn album_tracks(&self, album_name: &str) -> Result<Vec<Track>> {
        let wanted = album_name.trim().to_lowercase();
        let tracks = self
            .catalog
            .all()
            .await?
            .into_iter()
            .filter(|t| t.album.trim().to_lowercase() == wanted)
            .collect();
        Ok(tracks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_desktop::{FsBlobStore, SqliteKvStore};
    use bridge_traits::error::BridgeError;
    use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy};
    use bridge_traits::remote::{AccessUrl, ListPage, RemoteObject};
    use bytes::Bytes;
    use chrono::Utc;
    use mockall::mock;
    use std::collections::HashMap;
    use tempfile::tempdir;

    mock! {
        Remote {}

        #[async_trait]
        impl ObjectCatalog for Remote {
            async fn list_page(
                &self,
                continuation_token: Option<String>,
                limit: i32,
            ) -> bridge_traits::Result<ListPage>;
            async fn access_url(&self, key: &str) -> bridge_traits::Result<AccessUrl>;
            async fn fetch_range(
                &self,
                key: &str,
                start: u64,
                end: u64,
            ) -> bridge_traits::Result<Bytes>;
        }
    }

    struct StubHttp {
        fail: bool,
    }

    #[async_trait]
    impl HttpClient for StubHttp {
        async fn execute(
            &self,
            _request: HttpRequest,
        ) -> bridge_traits::Result<HttpResponse> {
            if self.fail {
                return Err(BridgeError::OperationFailed("connection refused".into()));
            }
            Ok(HttpResponse {
                status: 200,
                headers: HashMap::new(),
                body: Bytes::from_static(b"audio"),
            })
        }

        async fn execute_with_retry(
            &self,
            request: HttpRequest,
            _policy: RetryPolicy,
        ) -> bridge_traits::Result<HttpResponse> {
            self.execute(request).await
        }
    }

    struct FailingBlobStore;

    #[async_trait]
    impl bridge_traits::blob::BlobStore for FailingBlobStore {
        async fn put(&self, _id: &str, _data: Bytes) -> bridge_traits::Result<()> {
            Err(BridgeError::StorageError("disk full".into()))
        }

        async fn get(&self, id: &str) -> bridge_traits::Result<Bytes> {
            Err(BridgeError::NotFound(id.to_string()))
        }

        async fn contains(&self, _id: &str) -> bridge_traits::Result<bool> {
            Ok(false)
        }

        async fn remove(&self, id: &str) -> bridge_traits::Result<()> {
            Err(BridgeError::NotFound(id.to_string()))
        }
    }

    fn signed_url() -> AccessUrl {
        AccessUrl {
            url: "https://bucket.example.com/signed".to_string(),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        }
    }

    fn track(key: &str) -> Track {
        Track::from_remote(&RemoteObject {
            key: key.to_string(),
            size: 100,
            last_modified: Some(Utc::now()),
        })
    }

    async fn manager(
        remote: MockRemote,
        http_fails: bool,
    ) -> (tempfile::TempDir, DownloadManager, Arc<TrackCatalog>) {
        let dir = tempdir().unwrap();
        let blobs = FsBlobStore::open(dir.path()).await.unwrap();
        let store = Arc::new(ContentStore::new(
            Arc::new(blobs),
            Arc::new(StubHttp { fail: http_fails }),
        ));
        let kv = SqliteKvStore::in_memory().await.unwrap();
        let catalog = Arc::new(TrackCatalog::new(Arc::new(kv)));
        let manager = DownloadManager::new(Arc::new(remote), store, Arc::clone(&catalog));
        (dir, manager, catalog)
    }

    #[tokio::test]
    async fn download_records_local_path() {
        let mut remote = MockRemote::new();
        remote
            .expect_access_url()
            .times(1)
            .returning(|_| Ok(signed_url()));

        let (_dir, manager, catalog) = manager(remote, false).await;
        catalog.upsert(track("music/A/one.mp3")).await.unwrap();

        assert!(manager.download_track("music/A/one.mp3").await.unwrap());

        let stored = catalog.get("music/A/one.mp3").await.unwrap().unwrap();
        assert!(stored.is_downloaded());
    }

    #[tokio::test]
    async fn second_download_is_a_noop() {
        let mut remote = MockRemote::new();
        remote
            .expect_access_url()
            .times(1)
            .returning(|_| Ok(signed_url()));

        let (_dir, manager, catalog) = manager(remote, false).await;
        catalog.upsert(track("music/A/one.mp3")).await.unwrap();

        assert!(manager.download_track("music/A/one.mp3").await.unwrap());
        assert!(!manager.download_track("music/A/one.mp3").await.unwrap());
    }

    #[tokio::test]
    async fn failed_download_leaves_catalog_untouched() {
        let mut remote = MockRemote::new();
        remote.expect_access_url().returning(|_| Ok(signed_url()));

        let (_dir, manager, catalog) = manager(remote, true).await;
        catalog.upsert(track("music/A/one.mp3")).await.unwrap();

        assert!(manager.download_track("music/A/one.mp3").await.is_err());

        let stored = catalog.get("music/A/one.mp3").await.unwrap().unwrap();
        assert!(!stored.is_downloaded());
        assert!(manager.in_flight_keys().is_empty());
    }

    #[tokio::test]
    async fn failed_store_write_leaves_catalog_untouched() {
        let mut remote = MockRemote::new();
        remote.expect_access_url().returning(|_| Ok(signed_url()));

        // The fetch succeeds; persisting the bytes does not.
        let store = Arc::new(ContentStore::new(
            Arc::new(FailingBlobStore),
            Arc::new(StubHttp { fail: false }),
        ));
        let kv = SqliteKvStore::in_memory().await.unwrap();
        let catalog = Arc::new(TrackCatalog::new(Arc::new(kv)));
        let manager = DownloadManager::new(Arc::new(remote), store, Arc::clone(&catalog));

        catalog.upsert(track("music/A/one.mp3")).await.unwrap();

        assert!(manager.download_track("music/A/one.mp3").await.is_err());

        let stored = catalog.get("music/A/one.mp3").await.unwrap().unwrap();
        assert!(!stored.is_downloaded());
        assert!(manager.in_flight_keys().is_empty());
    }

    #[tokio::test]
    async fn download_unknown_track_fails() {
        let (_dir, manager, _catalog) = manager(MockRemote::new(), false).await;
        assert!(matches!(
            manager.download_track("missing").await,
            Err(CacheError::TrackNotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_clears_local_path() {
        let mut remote = MockRemote::new();
        remote.expect_access_url().returning(|_| Ok(signed_url()));

        let (_dir, manager, catalog) = manager(remote, false).await;
        catalog.upsert(track("music/A/one.mp3")).await.unwrap();
        manager.download_track("music/A/one.mp3").await.unwrap();

        manager.delete_track("music/A/one.mp3").await.unwrap();

        let stored = catalog.get("music/A/one.mp3").await.unwrap().unwrap();
        assert!(!stored.is_downloaded());
    }

    #[tokio::test]
    async fn delete_without_local_copy_is_noop() {
        let (_dir, manager, catalog) = manager(MockRemote::new(), false).await;
        catalog.upsert(track("music/A/one.mp3")).await.unwrap();

        manager.delete_track("music/A/one.mp3").await.unwrap();
    }

    #[tokio::test]
    async fn album_download_skips_failures() {
        let mut remote = MockRemote::new();
        remote.expect_access_url().returning(|key: &str| {
            if key.contains("bad") {
                Err(BridgeError::OperationFailed("no such key".into()))
            } else {
                Ok(signed_url())
            }
        });

        let (_dir, manager, catalog) = manager(remote, false).await;
        catalog.upsert(track("music/A/good.mp3")).await.unwrap();
        catalog.upsert(track("music/A/bad.mp3")).await.unwrap();
        catalog.upsert(track("music/B/other.mp3")).await.unwrap();

        let downloaded = manager.download_album("A").await.unwrap();
        assert_eq!(downloaded, 1);

        // The failure did not stop the rest of the album.
        let good = catalog.get("music/A/good.mp3").await.unwrap().unwrap();
        assert!(good.is_downloaded());
    }

    #[tokio::test]
    async fn album_delete_counts_removed_copies() {
        let mut remote = MockRemote::new();
        remote.expect_access_url().returning(|_| Ok(signed_url()));

        let (_dir, manager, catalog) = manager(remote, false).await;
        catalog.upsert(track("music/A/one.mp3")).await.unwrap();
        catalog.upsert(track("music/A/two.mp3")).await.unwrap();
        manager.download_track("music/A/one.mp3").await.unwrap();

        let removed = manager.delete_album("A").await.unwrap();
        assert_eq!(removed, 1);
    }
}
