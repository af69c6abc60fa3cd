//! Remote Object Store Abstraction
//!
//! Boundary to the bucket the library streams from: paginated listing with
//! continuation tokens, time-limited access URLs, and byte-range fetches
//! for metadata sniffing. The core never mutates remote content.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// One object as reported by the remote store.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteObject {
    /// Full path of the object within the bucket.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// Last-modified timestamp, if the store reports one.
    pub last_modified: Option<DateTime<Utc>>,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub objects: Vec<RemoteObject>,
    /// Token resuming the listing exactly after this page.
    pub next_continuation_token: Option<String>,
    /// Whether more pages follow.
    pub is_truncated: bool,
}

impl ListPage {
    /// The only valid terminal state: not truncated and no token.
    pub fn is_terminal(&self) -> bool {
        !self.is_truncated && self.next_continuation_token.is_none()
    }

    /// A truncated page with no continuation token cannot be resumed;
    /// callers must stop and treat the listing as incomplete.
    pub fn is_consistent(&self) -> bool {
        !(self.is_truncated && self.next_continuation_token.is_none())
    }
}

/// A time-limited URL granting direct read access to one object.
#[derive(Debug, Clone)]
pub struct AccessUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Remote object catalog.
#[async_trait]
pub trait ObjectCatalog: Send + Sync {
    /// Fetch one listing page, resuming from `continuation_token` when
    /// present. Tokens remain valid across process restarts for as long as
    /// the remote store honors them.
    async fn list_page(
        &self,
        continuation_token: Option<String>,
        limit: i32,
    ) -> Result<ListPage>;

    /// Issue a time-limited access URL for one object. URLs expire, so
    /// callers must request them lazily rather than precomputing them.
    async fn access_url(&self, key: &str) -> Result<AccessUrl>;

    /// Fetch the inclusive byte range `[start, end]` of one object. Used
    /// only for metadata sniffing; never fetches the whole object.
    async fn fetch_range(&self, key: &str, start: u64, end: u64) -> Result<Bytes>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_state_detection() {
        let done = ListPage::default();
        assert!(done.is_terminal());
        assert!(done.is_consistent());

        let more = ListPage {
            is_truncated: true,
            next_continuation_token: Some("token".into()),
            ..Default::default()
        };
        assert!(!more.is_terminal());
        assert!(more.is_consistent());
    }

    #[test]
    fn truncated_without_token_is_inconsistent() {
        let broken = ListPage {
            is_truncated: true,
            next_continuation_token: None,
            ..Default::default()
        };
        assert!(!broken.is_terminal());
        assert!(!broken.is_consistent());
    }
}
