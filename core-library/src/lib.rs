//! # Core Library
//!
//! Domain models and the persisted track catalog. The catalog is the single
//! source of truth for every known track: indexing, downloads, and album
//! grouping all read and write through it.

pub mod catalog;
pub mod error;
pub mod models;

pub use catalog::TrackCatalog;
pub use error::{LibraryError, Result};
pub use models::{Album, Track, TrackMetadata, UNKNOWN_ALBUM, UNKNOWN_ARTIST};
