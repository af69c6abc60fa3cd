//! Domain models for the track library
//!
//! Tracks are keyed by their full object path in the remote bucket. Albums
//! are not stored; they are derived from tracks on demand.

use bridge_traits::remote::RemoteObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder used when no album can be derived from an object key.
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Placeholder used when a file carries no artist tag.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Metadata extracted from a file's tag header.
///
/// Every field has a defined fallback, so extraction never fails outright:
/// an unreadable file still yields usable metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMetadata {
    /// Tagged title, or a cleaned-up form of the file name.
    pub title: String,
    /// Tagged artist, or [`UNKNOWN_ARTIST`].
    pub artist: String,
    /// Duration in seconds; 0.0 when unknown.
    pub duration: f64,
    /// Bitrate in bits per second; 0 when unknown.
    pub bitrate: u32,
}

/// One track in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Full object path in the remote bucket. Primary key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// Last-modified timestamp reported by the remote store.
    pub last_modified: DateTime<Utc>,
    /// Album name derived from the key's parent path segment.
    pub album: String,
    /// Final path segment of the key.
    pub file_name: String,
    /// Extracted tag metadata; absent until enrichment runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TrackMetadata>,
    /// Cache id of this album's artwork, when resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_art_path: Option<String>,
    /// Cache id of the downloaded audio, when available offline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
}

impl Track {
    /// Builds a basic track record from a remote listing entry. Album and
    /// file name come from the key structure; metadata comes later.
    pub fn from_remote(object: &RemoteObject) -> Self {
        let segments: Vec<&str> = object.key.split('/').filter(|s| !s.is_empty()).collect();

        let file_name = segments
            .last()
            .map(|s| s.to_string())
            .unwrap_or_else(|| object.key.clone());

        let album = if segments.len() >= 2 {
            segments[segments.len() - 2].to_string()
        } else {
            UNKNOWN_ALBUM.to_string()
        };

        Self {
            key: object.key.clone(),
            size: object.size,
            last_modified: object.last_modified.unwrap_or_else(Utc::now),
            album,
            file_name,
            metadata: None,
            album_art_path: None,
            local_path: None,
        }
    }

    /// Whether a local audio copy is recorded for this track.
    pub fn is_downloaded(&self) -> bool {
        self.local_path.is_some()
    }

    /// Display artist, falling back when metadata is absent.
    pub fn artist(&self) -> &str {
        self.metadata
            .as_ref()
            .map(|m| m.artist.as_str())
            .unwrap_or(UNKNOWN_ARTIST)
    }
}

/// An album derived from the catalog by grouping tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    /// Display name: the first spelling seen among the grouped tracks.
    pub name: String,
    pub tracks: Vec<Track>,
}

impl Album {
    /// Artwork id for the album: the first one any member track carries.
    pub fn art_path(&self) -> Option<&str> {
        self.tracks
            .iter()
            .find_map(|t| t.album_art_path.as_deref())
    }

    /// Number of tracks available offline.
    pub fn downloaded_count(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_downloaded()).count()
    }
}
