//! Key/Value Persistence Abstraction
//!
//! String key/value storage backing the persisted track-catalog snapshot.
//! One key holds the whole JSON catalog map; readers load it on startup
//! without re-indexing.

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait KvStore: Send + Sync {
    /// Retrieve a value. `Ok(None)` if the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, replacing any existing one.
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}
