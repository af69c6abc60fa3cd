//! Core service façade and bootstrap helpers.
//!
//! Wires the desktop bridges, the S3 provider, and the core crates into a
//! single handle a host application can hold: bootstrap from [`AppConfig`],
//! start index runs, manage offline downloads, browse the library.

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_desktop::{FsBlobStore, ReqwestHttpClient, SqliteKvStore};
use bridge_traits::remote::ObjectCatalog;
use core_cache::{ContentStore, DownloadManager};
use core_index::{IndexConfig, IndexOutcome, IndexProgress, IndexingPipeline};
use core_library::{Album, Track, TrackCatalog};
use core_metadata::providers::ItunesArtClient;
use core_metadata::{ArtworkResolver, MetadataExtractor};
use core_runtime::config::AppConfig;
use core_runtime::logging::{init_logging, LoggingConfig};
use provider_s3::S3CatalogClient;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Minimum delay between artwork provider requests.
const ARTWORK_RATE_LIMIT_MS: u64 = 1000;

/// A running index job: progress stream, cancellation, and completion.
pub struct IndexHandle {
    cancel: CancellationToken,
    pub progress: mpsc::Receiver<IndexProgress>,
    task: JoinHandle<core_index::Result<IndexOutcome>>,
}

impl IndexHandle {
    /// Requests cancellation. The run stops at the next batch boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the run to finish and returns its outcome.
    pub async fn wait(self) -> Result<IndexOutcome> {
        let outcome = self
            .task
            .await
            .map_err(|e| CoreError::TaskFailed(e.to_string()))??;
        Ok(outcome)
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct MusicService {
    catalog: Arc<TrackCatalog>,
    store: Arc<ContentStore>,
    downloads: Arc<DownloadManager>,
    pipeline: Arc<IndexingPipeline>,
}

impl MusicService {
    /// Builds the full service stack from configuration: SQLite-backed
    /// catalog, filesystem media cache, S3 remote, and the enrichment
    /// pipeline with iTunes artwork resolution.
    pub async fn bootstrap(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let http = Arc::new(ReqwestHttpClient::new());
        let kv = Arc::new(SqliteKvStore::new(config.database_path()).await?);
        let blobs = Arc::new(FsBlobStore::open(config.media_dir()).await?);
        let remote: Arc<dyn ObjectCatalog> =
            Arc::new(S3CatalogClient::connect(&config.storage).await?);

        let catalog = Arc::new(TrackCatalog::new(kv));
        let store = Arc::new(ContentStore::new(blobs, http.clone()));

        let art_source = Arc::new(ItunesArtClient::new(http, ARTWORK_RATE_LIMIT_MS));
        let artwork = Arc::new(ArtworkResolver::new(Arc::clone(&store), art_source));

        let pipeline = Arc::new(IndexingPipeline::new(
            Arc::clone(&remote),
            Arc::clone(&catalog),
            Arc::new(MetadataExtractor::new()),
            Some(artwork),
            IndexConfig::default(),
        ));

        let downloads = Arc::new(DownloadManager::new(
            remote,
            Arc::clone(&store),
            Arc::clone(&catalog),
        ));

        info!(bucket = %config.storage.bucket, "Music service ready");

        Ok(Self {
            catalog,
            store,
            downloads,
            pipeline,
        })
    }

    /// Initializes process-wide logging. Call once at startup.
    pub fn init_logging(config: LoggingConfig) -> Result<()> {
        init_logging(config).map_err(CoreError::Runtime)
    }

    /// Starts a background index run and returns its handle.
    pub fn start_index(&self) -> IndexHandle {
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(64);

        let pipeline = Arc::clone(&self.pipeline);
        let token = cancel.clone();
        let task = tokio::spawn(async move { pipeline.run(token, tx).await });

        IndexHandle {
            cancel,
            progress: rx,
            task,
        }
    }

    /// All tracks in the catalog.
    pub async fn tracks(&self) -> Result<Vec<Track>> {
        Ok(self.catalog.all().await?)
    }

    /// The catalog grouped into albums.
    pub async fn albums(&self) -> Result<Vec<Album>> {
        Ok(self.catalog.albums().await?)
    }

    /// Offline download operations.
    pub fn downloads(&self) -> Arc<DownloadManager> {
        Arc::clone(&self.downloads)
    }

    /// Direct access to cached content (audio bytes, artwork images).
    pub fn content(&self) -> Arc<ContentStore> {
        Arc::clone(&self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_runtime::config::StorageConfig;

    fn test_config(data_dir: std::path::PathBuf) -> AppConfig {
        AppConfig {
            storage: StorageConfig {
                bucket: "music".to_string(),
                region: "us-east-1".to_string(),
                access_key_id: "AKIATEST".to_string(),
                secret_access_key: "secret".to_string(),
                endpoint_url: Some("http://localhost:9000".to_string()),
                url_ttl_secs: 3600,
            },
            data_dir,
            log_filter: None,
        }
    }

    #[tokio::test]
    async fn bootstrap_wires_the_stack() {
        let dir = tempfile::tempdir().unwrap();
        let service = MusicService::bootstrap(test_config(dir.path().to_path_buf()))
            .await
            .unwrap();

        assert!(service.tracks().await.unwrap().is_empty());
        assert!(service.albums().await.unwrap().is_empty());
        assert!(service.downloads().in_flight_keys().is_empty());
    }

    #[tokio::test]
    async fn bootstrap_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path().to_path_buf());
        config.storage.bucket = String::new();

        assert!(MusicService::bootstrap(config).await.is_err());
    }
}
