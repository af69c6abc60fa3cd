//! # Core Cache
//!
//! Offline media cache: a content store over the blob bridge plus the
//! download manager that keeps the catalog truthful about what is cached.

pub mod download;
pub mod error;
pub mod store;

pub use download::DownloadManager;
pub use error::{CacheError, Result};
pub use store::{album_art_id, ContentStore};
