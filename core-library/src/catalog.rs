//! Persisted track catalog
//!
//! The catalog stores the full track map as one JSON document in the
//! key/value store, keyed by object path. Writes go through a single
//! read-modify-write section guarded by a mutex, so concurrent upserts
//! never lose each other's updates.

use crate::error::Result;
use crate::models::{Album, Track};
use bridge_traits::kv::KvStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

const TRACKS_KEY: &str = "tracks";

/// Single source of truth for every known track.
pub struct TrackCatalog {
    kv: Arc<dyn KvStore>,
    write_lock: Mutex<()>,
}

impl TrackCatalog {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self {
            kv,
            write_lock: Mutex::new(()),
        }
    }

    /// Loads the full track map. An absent document is an empty catalog.
    pub async fn load(&self) -> Result<HashMap<String, Track>> {
        match self.kv.get(TRACKS_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(HashMap::new()),
        }
    }

    async fn save(&self, tracks: &HashMap<String, Track>) -> Result<()> {
        let raw = serde_json::to_string(tracks)?;
        self.kv.put(TRACKS_KEY, &raw).await?;
        Ok(())
    }

    /// Inserts or replaces one track.
    pub async fn upsert(&self, track: Track) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut tracks = self.load().await?;
        tracks.insert(track.key.clone(), track);
        self.save(&tracks).await
    }

    /// Inserts or replaces a batch of tracks in one write.
    ///
    /// Entries already present keep their enriched fields unless the
    /// incoming track carries them; a re-listed track never loses its
    /// metadata, artwork, or local copy just because the bucket was
    /// enumerated again.
    pub async fn upsert_all(&self, incoming: Vec<Track>) -> Result<()> {
        if incoming.is_empty() {
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;
        let mut tracks = self.load().await?;

        let count = incoming.len();
        for mut track in incoming {
            if let Some(existing) = tracks.get(&track.key) {
                if track.metadata.is_none() {
                    track.metadata = existing.metadata.clone();
                }
                if track.album_art_path.is_none() {
                    track.album_art_path = existing.album_art_path.clone();
                }
                if track.local_path.is_none() {
                    track.local_path = existing.local_path.clone();
                }
            }
            tracks.insert(track.key.clone(), track);
        }

        self.save(&tracks).await?;
        debug!(count = count, "Upserted tracks");
        Ok(())
    }

    /// Looks up one track by key.
    pub async fn get(&self, key: &str) -> Result<Option<Track>> {
        Ok(self.load().await?.remove(key))
    }

    /// All tracks, sorted by key for stable ordering.
    pub async fn all(&self) -> Result<Vec<Track>> {
        let mut tracks: Vec<Track> = self.load().await?.into_values().collect();
        tracks.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(tracks)
    }

    /// Removes one track. Removing an absent key is a no-op.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut tracks = self.load().await?;
        if tracks.remove(key).is_some() {
            self.save(&tracks).await?;
        }
        Ok(())
    }

    /// Groups the catalog into albums.
    pub async fn albums(&self) -> Result<Vec<Album>> {
        Ok(group_albums(self.all().await?))
    }
}

/// Groups tracks into albums by name, treating names that differ only in
/// case or surrounding whitespace as the same album. The display name is
/// the first spelling encountered; albums come back sorted by it.
pub fn group_albums(tracks: Vec<Track>) -> Vec<Album> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, Album> = HashMap::new();

    for track in tracks {
        let normalized = track.album.trim().to_lowercase();
        match grouped.get_mut(&normalized) {
            Some(album) => album.tracks.push(track),
            None => {
                order.push(normalized.clone());
                grouped.insert(
                    normalized,
                    Album {
                        name: track.album.trim().to_string(),
                        tracks: vec![track],
                    },
                );
            }
        }
    }

    let mut albums: Vec<Album> = order
        .into_iter()
        .filter_map(|key| grouped.remove(&key))
        .collect();
    albums.sort_by(|a, b| a.name.cmp(&b.name));
    albums
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrackMetadata;
    use bridge_desktop::SqliteKvStore;
    use bridge_traits::remote::RemoteObject;
    use chrono::Utc;

    async fn catalog() -> TrackCatalog {
        let kv = SqliteKvStore::in_memory().await.unwrap();
        TrackCatalog::new(Arc::new(kv))
    }

    fn track(key: &str) -> Track {
        Track::from_remote(&RemoteObject {
            key: key.to_string(),
            size: 100,
            last_modified: Some(Utc::now()),
        })
    }

    #[tokio::test]
    async fn empty_catalog_loads_as_empty() {
        let catalog = catalog().await;
        assert!(catalog.load().await.unwrap().is_empty());
        assert!(catalog.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upsert_then_get() {
        let catalog = catalog().await;
        catalog.upsert(track("music/A/one.mp3")).await.unwrap();

        let found = catalog.get("music/A/one.mp3").await.unwrap().unwrap();
        assert_eq!(found.album, "A");
        assert!(catalog.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reindex_preserves_enriched_fields() {
        let catalog = catalog().await;

        let mut enriched = track("music/A/one.mp3");
        enriched.metadata = Some(TrackMetadata {
            title: "One".to_string(),
            artist: "Band".to_string(),
            duration: 180.0,
            bitrate: 320_000,
        });
        enriched.local_path = Some("audio-id".to_string());
        catalog.upsert(enriched).await.unwrap();

        // A fresh listing entry has no metadata or local path.
        catalog.upsert_all(vec![track("music/A/one.mp3")]).await.unwrap();

        let found = catalog.get("music/A/one.mp3").await.unwrap().unwrap();
        assert_eq!(found.metadata.unwrap().title, "One");
        assert_eq!(found.local_path.as_deref(), Some("audio-id"));
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let catalog = catalog().await;
        catalog.upsert(track("a/b.mp3")).await.unwrap();

        catalog.remove("a/b.mp3").await.unwrap();
        catalog.remove("a/b.mp3").await.unwrap();
        assert!(catalog.get("a/b.mp3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn catalog_survives_reload() {
        let kv = Arc::new(SqliteKvStore::in_memory().await.unwrap());
        {
            let catalog = TrackCatalog::new(kv.clone());
            catalog.upsert(track("a/b.mp3")).await.unwrap();
        }
        let reopened = TrackCatalog::new(kv);
        assert!(reopened.get("a/b.mp3").await.unwrap().is_some());
    }

    #[test]
    fn grouping_merges_case_variants() {
        let mut a = track("x/one.mp3");
        a.album = "Abbey Road".to_string();
        let mut b = track("y/two.mp3");
        b.album = "abbey road ".to_string();
        let mut c = track("z/three.mp3");
        c.album = "Revolver".to_string();

        let albums = group_albums(vec![a, b, c]);
        assert_eq!(albums.len(), 2);
        assert_eq!(albums[0].name, "Abbey Road");
        assert_eq!(albums[0].tracks.len(), 2);
        assert_eq!(albums[1].name, "Revolver");
    }
}
