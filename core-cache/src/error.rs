use bridge_traits::error::BridgeError;
use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Catalog error: {0}")]
    Library(#[from] LibraryError),

    #[error("Download failed for {id}: {reason}")]
    Download { id: String, reason: String },

    #[error("Not cached: {0}")]
    NotCached(String),

    #[error("Track not found: {0}")]
    TrackNotFound(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;
