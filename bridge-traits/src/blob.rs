//! Durable Blob Storage Abstraction
//!
//! A flat namespace of named binary blobs: no directory structure, no
//! metadata beyond the bytes. Used for downloaded track audio and
//! deduplicated album art.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Flat blob namespace with atomic writes.
///
/// `put` must be atomic: a reader never observes a partially written blob —
/// after a failed `put` the entry is absent, not truncated.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write a blob under `id`, replacing any existing entry.
    async fn put(&self, id: &str, data: Bytes) -> Result<()>;

    /// Read a blob. Returns `BridgeError::NotFound` if absent.
    async fn get(&self, id: &str) -> Result<Bytes>;

    /// Check whether a blob exists.
    async fn contains(&self, id: &str) -> Result<bool>;

    /// Delete a blob. Returns `BridgeError::NotFound` if absent.
    async fn remove(&self, id: &str) -> Result<()>;
}
