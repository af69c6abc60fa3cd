//! Indexing pipeline
//!
//! Two phases over the remote bucket:
//!
//! 1. **Listing** walks the paginated enumeration serially, following
//!    continuation tokens, and registers every supported audio object in
//!    the catalog. Any listing failure aborts the run; a partial listing
//!    is never committed as complete.
//! 2. **Enrichment** processes the listed tracks in fixed-size batches.
//!    Within a batch, tag ranges are fetched concurrently; batches run one
//!    after another so remote request concurrency stays bounded. Per-track
//!    failures downgrade to a basic entry and the run continues.
//!
//! Cancellation is checked between pages, between batches, and before
//! every catalog write. After the token fires, nothing more is persisted.

use crate::error::{IndexError, Result};
use bridge_traits::remote::ObjectCatalog;
use core_library::{Track, TrackCatalog};
use core_metadata::extractor::is_audio_file;
use core_metadata::{ArtworkResolver, MetadataExtractor};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Tuning knobs for a pipeline run.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Objects requested per listing page.
    pub page_size: i32,
    /// Pause between listing pages, to stay polite to the remote store.
    pub page_delay: Duration,
    /// Tracks enriched concurrently per batch.
    pub batch_size: usize,
    /// Inclusive end offset of the leading byte range fetched per track
    /// for tag parsing.
    pub metadata_range_bytes: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            page_delay: Duration::from_millis(250),
            batch_size: 5,
            metadata_range_bytes: 5000,
        }
    }
}

/// Which phase a progress report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexPhase {
    Listing,
    Enriching,
}

/// One progress report. During listing, `total` is the number of objects
/// seen so far; during enrichment it is the final track count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexProgress {
    pub phase: IndexPhase,
    pub processed: usize,
    pub total: usize,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOutcome {
    /// Tracks registered in the catalog.
    pub total: usize,
    /// Tracks that gained tag metadata this run.
    pub enriched: usize,
    /// Tracks left basic because their tag range could not be fetched.
    pub skipped: usize,
}

/// Drives a full index of the remote bucket into the catalog.
pub struct IndexingPipeline {
    remote: Arc<dyn ObjectCatalog>,
    catalog: Arc<TrackCatalog>,
    extractor: Arc<MetadataExtractor>,
    artwork: Option<Arc<ArtworkResolver>>,
    config: IndexConfig,
}

impl IndexingPipeline {
    pub fn new(
        remote: Arc<dyn ObjectCatalog>,
        catalog: Arc<TrackCatalog>,
        extractor: Arc<MetadataExtractor>,
        artwork: Option<Arc<ArtworkResolver>>,
        config: IndexConfig,
    ) -> Self {
        Self {
            remote,
            catalog,
            extractor,
            artwork,
            config,
        }
    }

    /// Runs the full pipeline. Progress reports go to `progress`; a
    /// dropped receiver does not stop the run.
    #[instrument(skip_all)]
    pub async fn run(
        &self,
        cancel: CancellationToken,
        progress: mpsc::Sender<IndexProgress>,
    ) -> Result<IndexOutcome> {
        let tracks = self.list_all(&cancel, &progress).await?;
        let total = tracks.len();

        if cancel.is_cancelled() {
            return Err(IndexError::Cancelled);
        }

        // Register everything up front so the library is browsable while
        // enrichment is still running.
        self.catalog.upsert_all(tracks.clone()).await?;
        info!(total = total, "Listing complete");

        let (enriched, skipped) = self.enrich_all(tracks, &cancel, &progress).await?;

        info!(total = total, enriched = enriched, skipped = skipped, "Indexing finished");
        Ok(IndexOutcome {
            total,
            enriched,
            skipped,
        })
    }

    async fn list_all(
        &self,
        cancel: &CancellationToken,
        progress: &mpsc::Sender<IndexProgress>,
    ) -> Result<Vec<Track>> {
        let mut tracks = Vec::new();
        let mut token: Option<String> = None;
        let mut first_page = true;

        loop {
            if cancel.is_cancelled() {
                return Err(IndexError::Cancelled);
            }

            if !first_page {
                tokio::time::sleep(self.config.page_delay).await;
            }
            first_page = false;

            let page = self
                .remote
                .list_page(token.clone(), self.config.page_size)
                .await
                .map_err(IndexError::Listing)?;

            if !page.is_consistent() {
                return Err(IndexError::InconsistentListing);
            }

            for object in &page.objects {
                // Directory placeholders and non-audio objects are not tracks.
                if object.key.ends_with('/') || !is_audio_file(&object.key) {
                    continue;
                }
                tracks.push(Track::from_remote(object));
            }

            debug!(seen = tracks.len(), "Listed page");
            let _ = progress
                .send(IndexProgress {
                    phase: IndexPhase::Listing,
                    processed: tracks.len(),
                    total: tracks.len(),
                })
                .await;

            if page.is_terminal() {
                return Ok(tracks);
            }
            token = page.next_continuation_token;
        }
    }

    async fn enrich_all(
        &self,
        tracks: Vec<Track>,
        cancel: &CancellationToken,
        progress: &mpsc::Sender<IndexProgress>,
    ) -> Result<(usize, usize)> {
        let total = tracks.len();
        let mut processed = 0;
        let mut enriched = 0;
        let mut skipped = 0;

        for batch in tracks.chunks(self.config.batch_size) {
            if cancel.is_cancelled() {
                return Err(IndexError::Cancelled);
            }

            let results = join_all(batch.iter().map(|t| self.enrich_one(t.clone()))).await;

            // The batch already ran, but nothing from it is persisted
            // once cancellation has been requested.
            if cancel.is_cancelled() {
                return Err(IndexError::Cancelled);
            }

            let mut updated = Vec::with_capacity(results.len());
            for (track, got_metadata) in results {
                if got_metadata {
                    enriched += 1;
                } else {
                    skipped += 1;
                }
                updated.push(track);
            }
            processed += updated.len();
            self.catalog.upsert_all(updated).await?;

            let _ = progress
                .send(IndexProgress {
                    phase: IndexPhase::Enriching,
                    processed,
                    total,
                })
                .await;
        }

        Ok((enriched, skipped))
    }

    /// Enriches one track. Fetch failures leave the basic entry in place;
    /// the bool reports whether metadata was extracted.
    async fn enrich_one(&self, mut track: Track) -> (Track, bool) {
        let end = self.config.metadata_range_bytes;
        let data = match self.remote.fetch_range(&track.key, 0, end).await {
            Ok(data) => data,
            Err(e) => {
                warn!(key = %track.key, error = %e, "Tag range fetch failed, keeping basic entry");
                return (track, false);
            }
        };

        let metadata = self.extractor.extract(&data, &track.file_name);

        if let Some(ref resolver) = self.artwork {
            track.album_art_path = resolver.resolve(&metadata.artist, &track.album).await;
        }

        track.metadata = Some(metadata);
        (track, true)
    }
}
