//! # Core Metadata
//!
//! Tag extraction from audio byte ranges and album artwork resolution
//! against external providers.

pub mod artwork;
pub mod error;
pub mod extractor;
pub mod providers;

pub use artwork::ArtworkResolver;
pub use error::{MetadataError, Result};
pub use extractor::MetadataExtractor;
pub use providers::AlbumArtSource;
