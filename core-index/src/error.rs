use bridge_traits::error::BridgeError;
use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    /// Listing the bucket failed. Listing errors are fatal: a partial
    /// enumeration must never masquerade as a complete library.
    #[error("Listing failed: {0}")]
    Listing(#[source] BridgeError),

    #[error("Listing returned a truncated page without a continuation token")]
    InconsistentListing,

    #[error("Indexing cancelled")]
    Cancelled,

    #[error("Catalog error: {0}")]
    Catalog(#[from] LibraryError),
}

pub type Result<T> = std::result::Result<T, IndexError>;
