//! # Core Index
//!
//! The indexing pipeline: enumerates the remote bucket page by page,
//! registers every audio object in the catalog, then enriches tracks in
//! bounded-concurrency batches with tag metadata and album artwork.

pub mod error;
pub mod pipeline;

pub use error::{IndexError, Result};
pub use pipeline::{IndexConfig, IndexOutcome, IndexPhase, IndexProgress, IndexingPipeline};
