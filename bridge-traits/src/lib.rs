//! # Platform Boundary Traits
//!
//! Abstractions over the external collaborators of the library core:
//! - `ObjectCatalog`: remote object store (paginated listing, presigned
//!   access URLs, byte-range fetches)
//! - `HttpClient`: plain HTTP fetches of presigned/artwork URLs
//! - `BlobStore`: flat namespace of durable local binary blobs
//! - `KvStore`: string key/value persistence for the catalog snapshot
//!
//! Implementations live in platform crates (`bridge-desktop`,
//! `provider-s3`); the core crates only ever see these traits.

pub mod blob;
pub mod error;
pub mod http;
pub mod kv;
pub mod remote;

pub use error::{BridgeError, Result};
