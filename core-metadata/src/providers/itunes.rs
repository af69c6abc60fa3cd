//! iTunes Search API Client
//!
//! Resolves album artwork through the keyless iTunes Search API.
//!
//! ## API Endpoint
//!
//! `https://itunes.apple.com/search?term={artist}+{album}&entity=album&limit=1`
//!
//! ## Rate Limiting
//!
//! Apple documents roughly 20 calls/minute for the search API. We apply a
//! conservative minimum delay between requests.

use crate::error::{MetadataError, Result};
use crate::providers::AlbumArtSource;
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// iTunes Search API base URL
const ITUNES_API_BASE: &str = "https://itunes.apple.com/search";

/// Timeout for API requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// iTunes Search API client
///
/// Handles fetching album artwork URLs from the iTunes Search API.
/// Implements automatic rate limiting to be respectful to the API.
pub struct ItunesArtClient {
    http_client: Arc<dyn HttpClient>,
    rate_limiter: Arc<Mutex<RateLimiter>>,
}

/// Simple rate limiter to enforce delay between requests
struct RateLimiter {
    last_request: Option<Instant>,
    min_delay: Duration,
}

impl RateLimiter {
    fn new(delay_ms: u64) -> Self {
        Self {
            last_request: None,
            min_delay: Duration::from_millis(delay_ms),
        }
    }

    async fn wait_if_needed(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_delay {
                let wait_time = self.min_delay - elapsed;
                debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "resultCount")]
    result_count: u32,
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(rename = "artworkUrl100")]
    artwork_url_100: Option<String>,
}

impl ItunesArtClient {
    /// Creates a new iTunes Search API client.
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client for making requests
    /// * `rate_limit_delay_ms` - Minimum delay between requests in milliseconds
    pub fn new(http_client: Arc<dyn HttpClient>, rate_limit_delay_ms: u64) -> Self {
        Self {
            http_client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(rate_limit_delay_ms))),
        }
    }

    async fn search(&self, artist: &str, album: &str) -> Result<Option<String>> {
        let term = format!("{} {}", artist, album);
        let url = format!(
            "{}?term={}&entity=album&limit=1",
            ITUNES_API_BASE,
            urlencoding::encode(&term)
        );

        debug!(artist = artist, album = album, "Querying iTunes Search");

        self.rate_limiter.lock().await.wait_if_needed().await;

        let request = HttpRequest::new(HttpMethod::Get, url)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| MetadataError::NetworkError(format!("iTunes request failed: {}", e)))?;

        if response.status == 429 {
            let retry_after = response
                .headers
                .get("Retry-After")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(MetadataError::RateLimited {
                provider: "iTunes".to_string(),
                retry_after_seconds: retry_after,
            });
        }

        if !response.is_success() {
            return Err(MetadataError::HttpError {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).to_string(),
            });
        }

        let parsed: SearchResponse = response
            .json()
            .map_err(|e| MetadataError::ArtworkError(format!("Malformed response: {}", e)))?;

        if parsed.result_count == 0 {
            debug!(artist = artist, album = album, "No artwork on iTunes");
            return Ok(None);
        }

        Ok(parsed
            .results
            .into_iter()
            .find_map(|r| r.artwork_url_100)
            .map(upscale_artwork_url))
    }
}

/// The search API returns 100x100 thumbnails; the same CDN path serves
/// larger renditions by rewriting the size segment.
fn upscale_artwork_url(url: String) -> String {
    url.replace("100x100", "600x600")
}

#[async_trait]
impl AlbumArtSource for ItunesArtClient {
    async fn art_url(&self, artist: &str, album: &str) -> Result<Option<String>> {
        self.search(artist, album).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::http::{HttpResponse, RetryPolicy};
    use bytes::Bytes;
    use std::collections::HashMap;

    struct StubHttp {
        status: u16,
        body: &'static str,
    }

    #[async_trait]
    impl HttpClient for StubHttp {
        async fn execute(
            &self,
            _request: HttpRequest,
        ) -> bridge_traits::Result<HttpResponse> {
            Ok(HttpResponse {
                status: self.status,
                headers: HashMap::new(),
                body: Bytes::from_static(self.body.as_bytes()),
            })
        }

        async fn execute_with_retry(
            &self,
            request: HttpRequest,
            _policy: RetryPolicy,
        ) -> bridge_traits::Result<HttpResponse> {
            self.execute(request).await
        }
    }

    fn client(status: u16, body: &'static str) -> ItunesArtClient {
        ItunesArtClient::new(Arc::new(StubHttp { status, body }), 0)
    }

    #[tokio::test]
    async fn resolves_and_upscales_artwork_url() {
        let client = client(
            200,
            r#"{"resultCount":1,"results":[{"artworkUrl100":"https://cdn.example.com/100x100bb.jpg"}]}"#,
        );

        let url = client.art_url("Pink Floyd", "The Wall").await.unwrap();
        assert_eq!(url.as_deref(), Some("https://cdn.example.com/600x600bb.jpg"));
    }

    #[tokio::test]
    async fn empty_results_resolve_to_none() {
        let client = client(200, r#"{"resultCount":0,"results":[]}"#);
        assert!(client.art_url("Nobody", "Nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn http_error_is_surfaced() {
        let client = client(500, "server error");
        assert!(matches!(
            client.art_url("a", "b").await,
            Err(MetadataError::HttpError { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn rate_limit_status_maps_to_typed_error() {
        let client = client(429, "slow down");
        assert!(matches!(
            client.art_url("a", "b").await,
            Err(MetadataError::RateLimited { .. })
        ));
    }
}
