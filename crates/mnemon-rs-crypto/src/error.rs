//! Error types for key management and sealing.

use thiserror::Error;

/// Errors returned by the at-rest cipher.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Reading or writing the key file failed.
    #[error("key file io error: {0}")]
    Io(#[from] std::io::Error),
    /// The key file exists but does not hold exactly 32 bytes.
    #[error("invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize { expected: usize, actual: usize },
    /// Sealing a payload failed.
    #[error("failed to seal payload")]
    Seal,
    /// The payload is shorter than a nonce or its tag failed to verify.
    #[error("failed to open payload: {0}")]
    Open(String),
}
