//! Content-addressed memory storage engine.
//!
//! Records are identified by the SHA-256 of their content, versioned as
//! `<base>-v<N>`, persisted as individual JSON files (optionally gzipped and
//! sealed with AES-256-GCM), and indexed in memory by id, category, tag,
//! keyword, and version. Writes flow through a bounded write-behind queue
//! with synchronous fallback; a size-bounded retention pass evicts the least
//! recently accessed records.

mod codec;
mod error;
mod fileio;
mod index;
mod model;
mod readonly;
mod scheduler;
mod store;

/// Engine error type.
pub use error::StoreError;
/// Record model and operation inputs/outputs.
pub use model::{
    content_base_id, strip_version, BulkDeleteOptions, KeywordCount, Memory, SearchQuery,
    StoreStats, Timeline,
};
/// Cold-load snapshot view over a data directory.
pub use readonly::ReadOnlyStore;
/// The read-write engine.
pub use store::Store;
