//! Public SDK surface for Mnemon.
//!
//! This crate re-exports the building blocks and provides a small
//! initialization helper to keep consumer setup consistent.

/// Re-export for convenience.
pub use mnemon_rs_config as config;
/// Re-export for convenience.
pub use mnemon_rs_crypto as crypto;
/// Re-export for convenience.
pub use mnemon_rs_keywords as keywords;
/// Re-export for convenience.
pub use mnemon_rs_protocol as protocol;
pub use mnemon_rs_store as store;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}
