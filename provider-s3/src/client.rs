//! S3 object catalog client
//!
//! Wraps the AWS SDK for the three operations the core needs: paginated
//! `ListObjectsV2`, presigned `GetObject` URLs, and byte-range `GetObject`
//! reads. Remote content is never written.

use crate::error::{Result, S3Error};
use async_trait::async_trait;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use bridge_traits::remote::{AccessUrl, ListPage, ObjectCatalog, RemoteObject};
use bytes::Bytes;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use core_runtime::config::StorageConfig;
use std::time::Duration;
use tracing::{debug, instrument};

/// S3-backed implementation of [`ObjectCatalog`].
pub struct S3CatalogClient {
    client: Client,
    bucket: String,
    url_ttl: Duration,
}

impl S3CatalogClient {
    /// Builds a client from storage configuration. Static credentials are
    /// used; a custom endpoint switches to path-style addressing for
    /// S3-compatible stores.
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "soundcrate-static",
        );

        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(ref endpoint) = config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        debug!(bucket = %config.bucket, "Connected S3 catalog client");

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            url_ttl: Duration::from_secs(config.url_ttl_secs),
        })
    }

    /// Wraps an existing SDK client, mainly for tests against local
    /// S3-compatible endpoints.
    pub fn with_client(client: Client, bucket: impl Into<String>, url_ttl: Duration) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            url_ttl,
        }
    }

    fn to_chrono(ts: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(ts.secs(), ts.subsec_nanos()).single()
    }
}

#[async_trait]
impl ObjectCatalog for S3CatalogClient {
    #[instrument(skip(self))]
    async fn list_page(
        &self,
        continuation_token: Option<String>,
        limit: i32,
    ) -> bridge_traits::Result<ListPage> {
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .max_keys(limit);

        if let Some(token) = continuation_token {
            request = request.continuation_token(token);
        }

        let response = request.send().await.map_err(|e| S3Error::Api {
            operation: "ListObjectsV2".to_string(),
            message: format!("{:?}", e),
        })?;

        let objects = response
            .contents
            .unwrap_or_default()
            .into_iter()
            .filter_map(|obj| {
                let key = obj.key?;
                // Directory placeholders carry no content.
                if key.ends_with('/') {
                    return None;
                }
                Some(RemoteObject {
                    key,
                    size: obj.size.unwrap_or(0).max(0) as u64,
                    last_modified: obj.last_modified.as_ref().and_then(Self::to_chrono),
                })
            })
            .collect::<Vec<_>>();

        debug!(count = objects.len(), "Listed page");

        Ok(ListPage {
            objects,
            next_continuation_token: response.next_continuation_token,
            is_truncated: response.is_truncated.unwrap_or(false),
        })
    }

    #[instrument(skip(self))]
    async fn access_url(&self, key: &str) -> bridge_traits::Result<AccessUrl> {
        let presigning = PresigningConfig::expires_in(self.url_ttl)
            .map_err(|e| S3Error::Presign(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| S3Error::Api {
                operation: "GetObject presign".to_string(),
                message: format!("{:?}", e),
            })?;

        let ttl = ChronoDuration::from_std(self.url_ttl)
            .unwrap_or_else(|_| ChronoDuration::seconds(3600));

        Ok(AccessUrl {
            url: presigned.uri().to_string(),
            expires_at: Utc::now() + ttl,
        })
    }

    #[instrument(skip(self))]
    async fn fetch_range(&self, key: &str, start: u64, end: u64) -> bridge_traits::Result<Bytes> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .range(format!("bytes={}-{}", start, end))
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    S3Error::ObjectNotFound {
                        key: key.to_string(),
                    }
                } else {
                    S3Error::Api {
                        operation: "GetObject range".to_string(),
                        message: format!("{:?}", e),
                    }
                }
            })?;

        let collected = response.body.collect().await.map_err(|e| S3Error::Api {
            operation: "GetObject body".to_string(),
            message: e.to_string(),
        })?;

        Ok(collected.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_conversion() {
        let ts = aws_sdk_s3::primitives::DateTime::from_secs(1_700_000_000);
        let converted = S3CatalogClient::to_chrono(&ts).unwrap();
        assert_eq!(converted.timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn connect_builds_client() {
        let config = StorageConfig {
            bucket: "music".to_string(),
            region: "us-east-1".to_string(),
            access_key_id: "AKIATEST".to_string(),
            secret_access_key: "secret".to_string(),
            endpoint_url: Some("http://localhost:9000".to_string()),
            url_ttl_secs: 3600,
        };

        let client = S3CatalogClient::connect(&config).await.unwrap();
        assert_eq!(client.bucket, "music");
    }
}
