//! Configuration models and environment loading.
//!
//! This crate owns the Mnemon config schema, its defaults, the `MCP_*`
//! environment overlay, and the validation applied at startup.

mod env;
mod error;
mod model;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Configuration schema models.
pub use model::*;
