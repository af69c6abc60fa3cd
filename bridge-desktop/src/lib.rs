//! # Desktop Bridge Implementations
//!
//! Native implementations of the `bridge-traits` boundaries:
//! - `ReqwestHttpClient`: HTTP with retry and connection pooling
//! - `FsBlobStore`: flat blob namespace over a local directory
//! - `SqliteKvStore`: key/value persistence in a SQLite table

pub mod blob;
pub mod http;
pub mod kv;

pub use blob::FsBlobStore;
pub use http::ReqwestHttpClient;
pub use kv::SqliteKvStore;
