//! Error types for the S3 provider

use thiserror::Error;

/// S3 provider errors
#[derive(Error, Debug)]
pub enum S3Error {
    /// An S3 API call failed
    #[error("S3 {operation} failed: {message}")]
    Api { operation: String, message: String },

    /// Presigning a request failed
    #[error("Failed to presign request: {0}")]
    Presign(String),

    /// Object not found
    #[error("Object not found: {key}")]
    ObjectNotFound { key: String },

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] bridge_traits::error::BridgeError),
}

/// Result type for S3 operations
pub type Result<T> = std::result::Result<T, S3Error>;

impl From<S3Error> for bridge_traits::error::BridgeError {
    fn from(error: S3Error) -> Self {
        match error {
            S3Error::ObjectNotFound { key } => {
                bridge_traits::error::BridgeError::NotFound(key)
            }
            S3Error::BridgeError(e) => e,
            other => bridge_traits::error::BridgeError::OperationFailed(other.to_string()),
        }
    }
}
