//! Read-only snapshot view over a data directory.
//!
//! Loads records through the same codec pipeline (and key file, when
//! encryption is on) without starting save workers; it never writes. A
//! concurrent writer is safe to run against the same directory because
//! record replacement is an atomic rename.

use crate::codec::Codec;
use crate::error::StoreError;
use crate::fileio;
use crate::model::{Memory, StoreStats, Timeline};
use log::{info, warn};
use mnemon_rs_config::StorageConfig;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;

/// Cold-load view exposing stats, listing, and the timeline.
pub struct ReadOnlyStore {
    data_dir: PathBuf,
    memories_dir: PathBuf,
    codec: Codec,
    records: RwLock<HashMap<String, Memory>>,
}

impl ReadOnlyStore {
    /// Load a snapshot of the configured data directory.
    ///
    /// Unreadable record files are skipped with a warning, exactly as the
    /// writable store does at startup.
    pub fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        let codec = Codec::new(config)?;
        let view = ReadOnlyStore {
            data_dir: config.data_dir.clone(),
            memories_dir: config.data_dir.join(fileio::MEMORIES_DIR),
            codec,
            records: RwLock::new(HashMap::new()),
        };
        view.refresh()?;
        info!(
            "read-only memory store initialized (data_dir={}, loaded={})",
            view.data_dir.display(),
            view.records.read().len()
        );
        Ok(view)
    }

    /// Clear the snapshot and reload it from disk.
    pub fn refresh(&self) -> Result<(), StoreError> {
        let mut loaded = HashMap::new();
        for (path, _) in fileio::list_record_files(&self.memories_dir)? {
            let compressed = path
                .file_name()
                .map(|name| name.to_string_lossy().ends_with(".gz"))
                .unwrap_or(false);

            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!("failed to read memory file (path={}, error={err})", path.display());
                    continue;
                }
            };
            match self.codec.decode(&bytes, compressed) {
                Ok(record) => {
                    loaded.insert(record.id.clone(), record);
                }
                Err(err) => {
                    warn!(
                        "skipping unreadable memory file (path={}, error={err})",
                        path.display()
                    );
                }
            }
        }

        *self.records.write() = loaded;
        Ok(())
    }

    /// Aggregate statistics over the snapshot.
    ///
    /// The storage limit is unknown to a read-only view, so
    /// `max_storage_size` and `storage_used_pct` are reported as zero; the
    /// total size comes from the files currently on disk.
    pub fn stats(&self) -> StoreStats {
        let records = self.records.read();

        let mut categories: HashMap<String, usize> = HashMap::new();
        let mut total_access_count = 0u64;
        let mut keywords: std::collections::HashSet<String> = std::collections::HashSet::new();
        for record in records.values() {
            if !record.category.is_empty() {
                *categories.entry(record.category.clone()).or_insert(0) += 1;
            }
            total_access_count += record.access_count;
            keywords.extend(record.keywords.iter().map(|kw| kw.to_lowercase()));
        }

        StoreStats {
            total_memories: records.len(),
            total_access_count,
            categories,
            data_directory: self.data_dir.display().to_string(),
            total_size: fileio::directory_size(&self.memories_dir),
            max_storage_size: 0,
            storage_used_pct: 0.0,
            unique_keywords: keywords.len(),
        }
    }

    /// List records filtered by category and tags, newest first.
    pub fn list(&self, category: &str, tags: &[String], limit: usize) -> Vec<Memory> {
        let records = self.records.read();
        let mut results: Vec<Memory> = records
            .values()
            .filter(|record| category.is_empty() || record.matches_category(category))
            .filter(|record| tags.is_empty() || record.has_any_tag(tags))
            .cloned()
            .collect();

        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if limit > 0 {
            results.truncate(limit);
        }
        results
    }

    /// Creation counts over the last 30 local calendar days.
    pub fn timeline(&self) -> Timeline {
        let records = self.records.read();
        Timeline::from_records(records.values())
    }
}
