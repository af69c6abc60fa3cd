//! # Core Runtime
//!
//! Shared runtime concerns for the library core: application configuration
//! and logging/tracing setup.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AppConfig, StorageConfig};
pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig};
