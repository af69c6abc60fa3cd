//! External Artwork Providers
//!
//! Clients for services that resolve album artwork URLs. Each provider
//! applies rate limiting to comply with API terms of service.

pub mod itunes;

pub use itunes::ItunesArtClient;

use crate::error::Result;
use async_trait::async_trait;

/// A source of album artwork URLs.
#[async_trait]
pub trait AlbumArtSource: Send + Sync {
    /// Looks up an artwork image URL for an artist/album pair.
    /// `Ok(None)` means the provider has no artwork for the pair.
    async fn art_url(&self, artist: &str, album: &str) -> Result<Option<String>>;
}
