//! Error types for config loading and validation.

use thiserror::Error;

/// Errors returned while loading or validating config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A specific field failed validation.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
}

impl ConfigError {
    /// Build a field-level validation error.
    pub(crate) fn invalid(path: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidField {
            path: path.to_string(),
            message: message.into(),
        }
    }
}
