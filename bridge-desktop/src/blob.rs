//! Blob Store Implementation over the Local Filesystem
//!
//! Keeps every blob as one file directly under a root directory. Writes go
//! through a temp file in a reserved `.partial/` subdirectory plus rename,
//! so an interrupted write never leaves a partial entry under the final
//! name. Temp names carry a unique per-write suffix; two writes never share
//! a temp file, and temp files can never shadow a stored entry.

use async_trait::async_trait;
use bridge_traits::{
    blob::BlobStore,
    error::{BridgeError, Result},
};
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::debug;

/// Subdirectory holding in-progress writes. Entry ids never start with a
/// dot, so this name is outside the entry namespace.
const PARTIAL_DIR: &str = ".partial";

static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Filesystem-backed flat blob namespace.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open a blob store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(PARTIAL_DIR)).await?;
        debug!(path = ?root, "Opened blob store");
        Ok(Self { root })
    }

    /// Default root under the platform data directory.
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("soundcrate")
            .join("media")
    }

    fn entry_path(&self, id: &str) -> Result<PathBuf> {
        // Flat namespace: ids are opaque file names, never paths. Leading
        // dots are reserved for store internals.
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(BridgeError::StorageError(format!("Invalid blob id: {id:?}")));
        }
        Ok(self.root.join(id))
    }

    fn partial_path(&self, id: &str) -> PathBuf {
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        self.root.join(PARTIAL_DIR).join(format!("{id}.{seq}"))
    }

    fn map_missing(e: std::io::Error, id: &str) -> BridgeError {
        if e.kind() == ErrorKind::NotFound {
            BridgeError::NotFound(id.to_string())
        } else {
            BridgeError::Io(e)
        }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, id: &str, data: Bytes) -> Result<()> {
        let path = self.entry_path(id)?;
        let tmp = self.partial_path(id);

        fs::write(&tmp, data.as_ref()).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(BridgeError::Io(e));
        }

        debug!(id = id, size = data.len(), "Stored blob");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Bytes> {
        let path = self.entry_path(id)?;
        let data = fs::read(&path)
            .await
            .map_err(|e| Self::map_missing(e, id))?;
        debug!(id = id, size = data.len(), "Read blob");
        Ok(Bytes::from(data))
    }

    async fn contains(&self, id: &str) -> Result<bool> {
        let path = self.entry_path(id)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let path = self.entry_path(id)?;
        fs::remove_file(&path)
            .await
            .map_err(|e| Self::map_missing(e, id))?;
        debug!(id = id, "Deleted blob");
        Ok(())
    }
}

/// Expose the root for diagnostics.
impl FsBlobStore {
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn put_get_roundtrip() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();

        store
            .put("blob-1", Bytes::from_static(b"hello"))
            .await
            .unwrap();

        assert!(store.contains("blob-1").await.unwrap());
        assert_eq!(store.get("blob-1").await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();

        match store.get("absent").await {
            Err(BridgeError::NotFound(id)) => assert_eq!(id, "absent"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn remove_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();

        assert!(matches!(
            store.remove("absent").await,
            Err(BridgeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn rejects_path_like_ids() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();

        assert!(store.get("../escape").await.is_err());
        assert!(store.put("a/b", Bytes::new()).await.is_err());
        assert!(store.put(".partial", Bytes::new()).await.is_err());
    }

    #[tokio::test]
    async fn dotted_ids_do_not_disturb_siblings() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();

        store.put("a.part", Bytes::from_static(b"art")).await.unwrap();
        store.put("a.1", Bytes::from_static(b"one")).await.unwrap();
        store.put("a.2", Bytes::from_static(b"two")).await.unwrap();

        assert_eq!(store.get("a.part").await.unwrap(), Bytes::from_static(b"art"));
        assert_eq!(store.get("a.1").await.unwrap(), Bytes::from_static(b"one"));
        assert_eq!(store.get("a.2").await.unwrap(), Bytes::from_static(b"two"));
    }

    #[tokio::test]
    async fn put_replaces_existing_entry() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();

        store.put("blob", Bytes::from_static(b"one")).await.unwrap();
        store.put("blob", Bytes::from_static(b"two")).await.unwrap();

        assert_eq!(store.get("blob").await.unwrap(), Bytes::from_static(b"two"));
    }
}
