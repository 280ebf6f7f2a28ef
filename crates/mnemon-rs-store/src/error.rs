//! Error types for store operations.

use thiserror::Error;

/// Errors returned by the storage engine.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The id or base id resolves to no stored record.
    #[error("memory not found: {0}")]
    NotFound(String),
    /// Missing required input, unconfirmed bulk delete, or invalid config.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// The encoded record would exceed the per-file size limit.
    #[error("memory file size {size} exceeds limit {limit}")]
    SizeLimit { size: u64, limit: u64 },
    /// Serialization, gzip, or AEAD processing failed.
    #[error("codec failure: {0}")]
    Codec(String),
    /// A directory or file operation failed.
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
    /// Draining the save queue exceeded the shutdown deadline.
    #[error("timed out waiting for save workers to complete")]
    Timeout,
    /// Unclassified failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Codec(err.to_string())
    }
}

impl From<mnemon_rs_crypto::CryptoError> for StoreError {
    fn from(err: mnemon_rs_crypto::CryptoError) -> Self {
        match err {
            mnemon_rs_crypto::CryptoError::Io(err) => StoreError::Io(err),
            other => StoreError::Codec(other.to_string()),
        }
    }
}
