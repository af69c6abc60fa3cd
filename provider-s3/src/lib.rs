//! # S3 Provider
//!
//! [`ObjectCatalog`](bridge_traits::remote::ObjectCatalog) implementation
//! over the AWS S3 API, covering AWS itself and S3-compatible stores
//! (MinIO, Cloudflare R2) via a custom endpoint.

pub mod client;
pub mod error;

pub use client::S3CatalogClient;
pub use error::{Result, S3Error};
