//! # Core Configuration Module
//!
//! Configuration for the library core: remote bucket credentials and local
//! data locations. Configuration can be loaded from a JSON file, from
//! environment variables, or built in code; `validate()` enforces fail-fast
//! checks with actionable messages before anything is initialized.
//!
//! ## Usage
//!
//! ```no_run
//! use core_runtime::config::AppConfig;
//!
//! let config = AppConfig::from_env()?;
//! config.validate()?;
//! # Ok::<(), core_runtime::Error>(())
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default lifetime of issued access URLs, in seconds.
pub const DEFAULT_URL_TTL_SECS: u64 = 3600;

/// Remote bucket connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Bucket holding the audio library.
    pub bucket: String,

    /// Bucket region.
    pub region: String,

    /// Static access key id.
    pub access_key_id: String,

    /// Static secret access key.
    pub secret_access_key: String,

    /// Custom endpoint for S3-compatible stores (MinIO, R2). When set,
    /// path-style addressing is used.
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Lifetime of issued access URLs in seconds.
    #[serde(default = "default_url_ttl_secs")]
    pub url_ttl_secs: u64,
}

fn default_url_ttl_secs() -> u64 {
    DEFAULT_URL_TTL_SECS
}

impl StorageConfig {
    /// Validates the storage configuration.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(Error::Config("Bucket name cannot be empty".to_string()));
        }

        if self.region.is_empty() && self.endpoint_url.is_none() {
            return Err(Error::Config(
                "Region is required when no custom endpoint is set".to_string(),
            ));
        }

        if self.access_key_id.is_empty() || self.secret_access_key.is_empty() {
            return Err(Error::Config(
                "Access credentials are required. Set access_key_id and secret_access_key, \
                 or the AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY environment variables."
                    .to_string(),
            ));
        }

        if let Some(ref endpoint) = self.endpoint_url {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(Error::Config(format!(
                    "Endpoint URL must start with http:// or https://, got: {}",
                    endpoint
                )));
            }
        }

        if self.url_ttl_secs == 0 {
            return Err(Error::Config(
                "Access URL lifetime must be greater than 0 seconds".to_string(),
            ));
        }

        // Presigned URLs cannot outlive the signing window.
        if self.url_ttl_secs > 7 * 24 * 3600 {
            return Err(Error::Config(
                "Access URL lifetime exceeds maximum of 7 days".to_string(),
            ));
        }

        Ok(())
    }
}

/// Application configuration for the library core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote bucket settings.
    pub storage: StorageConfig,

    /// Directory for local state: catalog database and cached media.
    pub data_dir: PathBuf,

    /// Custom log filter string (e.g., "core_index=debug,sqlx=warn").
    #[serde(default)]
    pub log_filter: Option<String>,
}

impl AppConfig {
    /// Loads configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Loads configuration from environment variables.
    ///
    /// Reads `SOUNDCRATE_BUCKET`, `AWS_REGION`, `AWS_ACCESS_KEY_ID`,
    /// `AWS_SECRET_ACCESS_KEY`, and optionally `SOUNDCRATE_ENDPOINT_URL`,
    /// `SOUNDCRATE_URL_TTL_SECS`, `SOUNDCRATE_DATA_DIR`, and `SOUNDCRATE_LOG`.
    pub fn from_env() -> Result<Self> {
        let require = |name: &str| -> Result<String> {
            std::env::var(name)
                .map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
        };

        let url_ttl_secs = match std::env::var("SOUNDCRATE_URL_TTL_SECS") {
            Ok(raw) => raw.parse().map_err(|e| {
                Error::Config(format!("Invalid SOUNDCRATE_URL_TTL_SECS: {}", e))
            })?,
            Err(_) => DEFAULT_URL_TTL_SECS,
        };

        let data_dir = std::env::var("SOUNDCRATE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_data_dir());

        Ok(Self {
            storage: StorageConfig {
                bucket: require("SOUNDCRATE_BUCKET")?,
                region: std::env::var("AWS_REGION").unwrap_or_default(),
                access_key_id: require("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
                endpoint_url: std::env::var("SOUNDCRATE_ENDPOINT_URL").ok(),
                url_ttl_secs,
            },
            data_dir,
            log_filter: std::env::var("SOUNDCRATE_LOG").ok(),
        })
    }

    /// Default data directory under the platform temp dir. Hosts normally
    /// override this with a real application-data location.
    pub fn default_data_dir() -> PathBuf {
        std::env::temp_dir().join("soundcrate")
    }

    /// Path of the catalog database within the data directory.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("catalog.db")
    }

    /// Directory holding cached media blobs.
    pub fn media_dir(&self) -> PathBuf {
        self.data_dir.join("media")
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        self.storage.validate()?;

        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::Config("Data directory cannot be empty".to_string()));
        }

        Ok(())
    }
}
