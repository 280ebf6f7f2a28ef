//! The read-write storage engine.

use crate::codec::Codec;
use crate::error::StoreError;
use crate::fileio;
use crate::index::IndexSet;
use crate::model::{
    content_base_id, strip_version, versioned_id, BulkDeleteOptions, KeywordCount, Memory,
    SearchQuery, StoreStats, Timeline,
};
use crate::scheduler::SaveScheduler;
use chrono::{Duration, Utc};
use log::{debug, info, warn};
use mnemon_rs_config::StorageConfig;
use mnemon_rs_keywords::{Extractor, DEFAULT_KEYWORDS};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Fraction of the storage limit retention evicts down to.
const RETENTION_TARGET: f64 = 0.9;
/// Default search result count when no limit is requested.
const DEFAULT_SEARCH_LIMIT: usize = 20;
/// Hard ceiling on search results.
const MAX_SEARCH_LIMIT: usize = 50;

/// State shared between the store front and its save workers.
pub(crate) struct Shared {
    pub(crate) config: StorageConfig,
    pub(crate) memories_dir: PathBuf,
    pub(crate) codec: Codec,
    pub(crate) state: RwLock<IndexSet>,
}

/// File-backed memory store.
///
/// A single instance owns its data directory; multiple instances in one
/// process must target distinct directories. The instance is created with
/// [`Store::open`], used, and shut down with [`Store::close`].
pub struct Store {
    shared: Arc<Shared>,
    scheduler: Option<SaveScheduler>,
    extractor: Extractor,
}

impl Store {
    /// Open (or initialize) a store over the configured data directory.
    ///
    /// Creates the directory layout, loads every readable record file into
    /// the index, and starts the save workers when async mode is enabled.
    /// Unreadable record files are skipped with a warning.
    pub fn open(config: StorageConfig) -> Result<Self, StoreError> {
        config
            .validate()
            .map_err(|err| StoreError::BadRequest(err.to_string()))?;

        let codec = Codec::new(&config)?;
        fileio::ensure_layout(&config.data_dir)?;
        if config.enable_encryption {
            info!(
                "encryption enabled (key_path={})",
                config.encryption_key_path.display()
            );
        }

        let memories_dir = config.data_dir.join(fileio::MEMORIES_DIR);
        let shared = Arc::new(Shared {
            memories_dir,
            codec,
            state: RwLock::new(IndexSet::default()),
            config,
        });
        shared.load_index()?;

        let scheduler = shared.config.enable_async.then(|| {
            SaveScheduler::start(
                Arc::clone(&shared),
                shared.config.queue_size,
                shared.config.worker_threads,
            )
        });

        {
            let state = shared.state.read();
            info!(
                "memory store initialized (data_dir={}, loaded={}, total_size={}, \
                 async={}, compression={}, encryption={})",
                shared.config.data_dir.display(),
                state.len(),
                state.total_size(),
                shared.config.enable_async,
                shared.config.enable_compression,
                shared.config.enable_encryption
            );
        }

        Ok(Store {
            shared,
            scheduler,
            extractor: Extractor::new(),
        })
    }

    /// Store a memory, superseding any existing current version of the same
    /// content.
    ///
    /// Index updates are visible to readers immediately; persistence happens
    /// through the write-behind queue in async mode (falling back to a
    /// synchronous save when the queue is full) or inline otherwise.
    pub fn store(
        &self,
        content: &str,
        summary: &str,
        category: &str,
        tags: Vec<String>,
        metadata: HashMap<String, String>,
    ) -> Result<Memory, StoreError> {
        if content.is_empty() {
            return Err(StoreError::BadRequest("content is required".to_string()));
        }

        let base = content_base_id(content);
        let now = Utc::now();
        let keywords = self.extract_keywords(content, summary);

        let mut to_save: Vec<Memory> = Vec::new();
        let record = {
            let mut state = self.shared.state.write();

            let (version, previous_version_id) = match state
                .current_id(&base)
                .map(str::to_string)
            {
                Some(current_id) => {
                    let previous = state
                        .get_mut(&current_id)
                        .ok_or_else(|| StoreError::Internal(format!("dangling alias: {base}")))?;
                    previous.is_current_version = false;
                    let version = previous.version + 1;
                    to_save.push(previous.clone());
                    (version, current_id)
                }
                None => (1, String::new()),
            };

            let record = Memory {
                id: versioned_id(&base, version),
                content: content.to_string(),
                summary: summary.to_string(),
                tags,
                category: category.to_string(),
                metadata,
                created_at: now,
                updated_at: now,
                access_count: 0,
                last_access: now,
                version,
                previous_version_id,
                is_current_version: true,
                keywords,
            };
            state.insert(record.clone());
            record
        };

        if record.version == 1 {
            debug!("storing new memory (id={}, category={category})", record.id);
        } else {
            debug!(
                "creating new memory version (id={}, version={}, previous={})",
                record.id, record.version, record.previous_version_id
            );
        }

        for superseded in to_save {
            self.schedule_save(superseded);
        }
        if self.scheduler.is_some() {
            self.schedule_save(record.clone());
        } else {
            self.shared.write_back(&record)?;
        }

        Ok(record)
    }

    /// Fetch a record by versioned id or base alias, updating its access
    /// statistics.
    ///
    /// The stats save is best-effort: failures are logged and the record is
    /// still returned.
    pub fn get(&self, id: &str) -> Result<Memory, StoreError> {
        let record = {
            let mut state = self.shared.state.write();
            let record_id = state
                .resolve_id(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            let record = state
                .get_mut(&record_id)
                .ok_or_else(|| StoreError::Internal(format!("missing record: {record_id}")))?;
            record.access_count += 1;
            record.last_access = Utc::now();
            record.clone()
        };

        debug!(
            "retrieved memory (id={}, version={}, access_count={})",
            record.id, record.version, record.access_count
        );
        self.save_stats(record.clone());
        Ok(record)
    }

    /// Search records by substring, category, tag, and recency scoring.
    ///
    /// Results are ordered by descending score with ties broken by insertion
    /// order, and truncated to `min(limit, 50)` (20 when the limit is zero).
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<Memory>, StoreError> {
        let query_lower = query.query.to_lowercase();
        let now = Utc::now();

        let results = {
            let state = self.shared.state.read();
            let candidates = state.candidates(&query.category, &query.tags);

            let mut scored: Vec<(f64, u64, Memory)> = Vec::new();
            for record in state.records() {
                if let Some(ids) = &candidates {
                    if !ids.contains(&record.id) {
                        continue;
                    }
                }
                let score = relevance_score(record, query, &query_lower, now);
                if score > 0.0 {
                    scored.push((score, state.arrival(&record.id), record.clone()));
                }
            }

            scored.sort_by(|a, b| {
                b.0.partial_cmp(&a.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.1.cmp(&b.1))
            });

            let limit = match query.limit {
                0 => DEFAULT_SEARCH_LIMIT,
                n => n.min(MAX_SEARCH_LIMIT),
            };
            scored.truncate(limit);
            scored.into_iter().map(|(_, _, record)| record).collect::<Vec<_>>()
        };

        info!(
            "search completed (query={}, results={})",
            query.query,
            results.len()
        );
        Ok(results)
    }

    /// List records filtered by category and tags, newest first.
    ///
    /// A zero limit returns every match; adapters apply their own defaults.
    pub fn list(
        &self,
        category: &str,
        tags: &[String],
        limit: usize,
    ) -> Result<Vec<Memory>, StoreError> {
        let state = self.shared.state.read();
        let candidates = state.candidates(category, tags);

        let mut results: Vec<Memory> = state
            .records()
            .filter(|record| match &candidates {
                Some(ids) => ids.contains(&record.id),
                None => true,
            })
            .cloned()
            .collect();

        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if limit > 0 {
            results.truncate(limit);
        }
        Ok(results)
    }

    /// Every version of a record, newest first.
    ///
    /// Accepts either a base id or a versioned id.
    pub fn get_history(&self, id: &str) -> Result<Vec<Memory>, StoreError> {
        let base = strip_version(id);
        let state = self.shared.state.read();

        let mut versions: Vec<Memory> = state
            .versions_of(base)
            .iter()
            .filter_map(|version_id| state.get(version_id).cloned())
            .collect();
        if versions.is_empty() {
            return Err(StoreError::NotFound(base.to_string()));
        }

        versions.sort_by(|a, b| b.version.cmp(&a.version));
        debug!(
            "retrieved memory history (base_id={base}, versions={})",
            versions.len()
        );
        Ok(versions)
    }

    /// Delete a record by versioned id or base alias.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.shared.remove_record(id)?;
        info!("memory deleted (id={id})");
        Ok(())
    }

    /// Delete every version of every base whose current record matches the
    /// given predicates. Returns the number of records removed; individual
    /// file failures are logged and skipped.
    pub fn bulk_delete(&self, options: &BulkDeleteOptions) -> Result<usize, StoreError> {
        if !options.confirm {
            return Err(StoreError::BadRequest(
                "confirmation required: set confirm to true".to_string(),
            ));
        }
        if options.is_empty() {
            return Err(StoreError::BadRequest(
                "at least one filter (category, tags, before_date, or query) must be specified"
                    .to_string(),
            ));
        }

        let query_lower = options.query.to_lowercase();
        let to_delete: Vec<String> = {
            let state = self.shared.state.read();
            let mut ids = Vec::new();
            for record in state.records() {
                if record.is_current_version && matches_bulk_filter(record, options, &query_lower)
                {
                    ids.extend(state.versions_of(record.base_id()).iter().cloned());
                }
            }
            ids
        };

        let mut deleted = 0usize;
        let mut failures = 0usize;
        for id in to_delete {
            match self.shared.remove_record(&id) {
                Ok(_) => deleted += 1,
                Err(StoreError::NotFound(_)) => {}
                Err(err) => {
                    failures += 1;
                    warn!("failed to delete memory (id={id}, error={err})");
                }
            }
        }

        if failures > 0 {
            warn!("bulk delete left records behind (deleted={deleted}, failed={failures})");
        }
        info!(
            "bulk delete completed (deleted={deleted}, category={}, tags={}, query={})",
            options.category,
            options.tags.len(),
            options.query
        );
        Ok(deleted)
    }

    /// Aggregate statistics over the index.
    pub fn stats(&self) -> StoreStats {
        let state = self.shared.state.read();

        let mut categories: HashMap<String, usize> = HashMap::new();
        let mut total_access_count = 0u64;
        for record in state.records() {
            if !record.category.is_empty() {
                *categories.entry(record.category.clone()).or_insert(0) += 1;
            }
            total_access_count += record.access_count;
        }

        let total_size = state.total_size();
        let max_storage_size = self.shared.config.max_storage_size;
        StoreStats {
            total_memories: state.len(),
            total_access_count,
            categories,
            data_directory: self.shared.config.data_dir.display().to_string(),
            total_size,
            max_storage_size,
            storage_used_pct: total_size as f64 / max_storage_size as f64 * 100.0,
            unique_keywords: state.unique_keywords(),
        }
    }

    /// Creation counts over the last 30 local calendar days.
    pub fn timeline(&self) -> Timeline {
        let state = self.shared.state.read();
        Timeline::from_records(state.records())
    }

    /// Records carrying a keyword, newest first.
    pub fn get_by_keyword(&self, keyword: &str, limit: usize) -> Vec<Memory> {
        let state = self.shared.state.read();
        let mut results: Vec<Memory> = state
            .ids_with_keyword(keyword)
            .iter()
            .filter_map(|id| state.get(id).cloned())
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if limit > 0 {
            results.truncate(limit);
        }
        results
    }

    /// The `n` keywords carried by the most records.
    pub fn top_keywords(&self, n: usize) -> Vec<KeywordCount> {
        let state = self.shared.state.read();
        let mut counts: Vec<KeywordCount> = state
            .keyword_counts()
            .map(|(keyword, count)| KeywordCount {
                keyword: keyword.to_string(),
                count,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.keyword.cmp(&b.keyword)));
        counts.truncate(n);
        counts
    }

    /// Shut down the save workers, draining the queue.
    ///
    /// After a normal return every store that succeeded before this call is
    /// on disk. Returns [`StoreError::Timeout`] when draining exceeds the
    /// 30-second deadline. In synchronous mode this returns immediately.
    pub fn close(&self) -> Result<(), StoreError> {
        info!("closing memory store");
        match &self.scheduler {
            Some(scheduler) => scheduler.shutdown(),
            None => Ok(()),
        }
    }

    /// Top-K keywords from content plus summary.
    fn extract_keywords(&self, content: &str, summary: &str) -> Vec<String> {
        let source = if summary.is_empty() {
            content.to_string()
        } else {
            format!("{content}\n{summary}")
        };
        self.extractor
            .extract(&source, DEFAULT_KEYWORDS)
            .into_iter()
            .map(|keyword| keyword.term)
            .collect()
    }

    /// Queue a record for persistence, saving synchronously when the queue
    /// is full or closed.
    fn schedule_save(&self, record: Memory) {
        let Some(scheduler) = &self.scheduler else {
            if let Err(err) = self.shared.write_back(&record) {
                warn!("failed to save memory (id={}, error={err})", record.id);
            }
            return;
        };

        if let Err(record) = scheduler.try_enqueue(record) {
            warn!(
                "save queue full, saving synchronously (id={})",
                record.id
            );
            if let Err(err) = self.shared.write_back(&record) {
                warn!("fallback save failed (id={}, error={err})", record.id);
            }
        }
    }

    /// Persist updated access statistics, warning on failure.
    fn save_stats(&self, record: Memory) {
        if let Some(scheduler) = &self.scheduler {
            if let Err(record) = scheduler.try_enqueue(record) {
                if let Err(err) = self.shared.write_back(&record) {
                    warn!(
                        "failed to update memory access stats (id={}, error={err})",
                        record.id
                    );
                }
            }
        } else if let Err(err) = self.shared.write_back(&record) {
            warn!(
                "failed to update memory access stats (id={}, error={err})",
                record.id
            );
        }
    }
}

impl Shared {
    /// Encode and atomically write a record, enforcing the per-file limit.
    fn persist(&self, record: &Memory) -> Result<u64, StoreError> {
        let bytes = self.codec.encode(record)?;
        let size = bytes.len() as u64;
        if size > self.config.max_file_size {
            return Err(StoreError::SizeLimit {
                size,
                limit: self.config.max_file_size,
            });
        }

        let path = fileio::record_path(&self.memories_dir, &record.id, self.codec.suffix());
        fileio::atomic_write(&path, &bytes)?;
        Ok(size)
    }

    /// Persist a record, update size accounting, and run retention when the
    /// total crosses the storage limit.
    pub(crate) fn write_back(&self, record: &Memory) -> Result<(), StoreError> {
        let size = self.persist(record)?;
        let needs_cleanup = {
            let mut state = self.state.write();
            state.set_size(&record.id, size);
            state.total_size() > self.config.max_storage_size
        };
        if needs_cleanup {
            self.enforce_retention();
        }
        Ok(())
    }

    /// Remove a record's file and index entries, resolving base aliases.
    fn remove_record(&self, id: &str) -> Result<(Memory, u64), StoreError> {
        let record_id = self
            .state
            .read()
            .resolve_id(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if let Some(path) = fileio::find_record_file(&self.memories_dir, &record_id) {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }

        self.state
            .write()
            .remove(&record_id)
            .ok_or_else(|| StoreError::NotFound(record_id))
    }

    /// Evict least-recently-accessed records until the total size is back
    /// under 90% of the storage limit.
    fn enforce_retention(&self) {
        let target = (self.config.max_storage_size as f64 * RETENTION_TARGET) as u64;

        let mut victims: Vec<(String, chrono::DateTime<Utc>)> = {
            let state = self.state.read();
            state
                .records()
                .map(|record| (record.id.clone(), record.last_access))
                .collect()
        };
        victims.sort_by(|a, b| a.1.cmp(&b.1));

        for (id, last_access) in victims {
            if self.state.read().total_size() <= target {
                break;
            }
            match self.remove_record(&id) {
                Ok((_, size)) => info!(
                    "evicted memory (id={id}, size={size}, last_access={last_access})"
                ),
                Err(err) => warn!("failed to evict memory (id={id}, error={err})"),
            }
        }
    }

    /// Rebuild the index from the memories directory, skipping files that
    /// fail to decode (wrong key, truncation, foreign payloads).
    fn load_index(&self) -> Result<(), StoreError> {
        let files = fileio::list_record_files(&self.memories_dir)?;
        let mut state = self.state.write();

        for (path, size) in files {
            let name = path.file_name().map(|n| n.to_string_lossy().to_string());
            let compressed = name
                .as_deref()
                .map(|n| n.ends_with(".gz"))
                .unwrap_or(false);

            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!("failed to read memory file (path={}, error={err})", path.display());
                    continue;
                }
            };

            let record = match self.codec.decode(&bytes, compressed) {
                Ok(record) => record,
                Err(err) => {
                    warn!(
                        "skipping unreadable memory file (path={}, error={err})",
                        path.display()
                    );
                    continue;
                }
            };

            let id = record.id.clone();
            state.insert(record);
            state.set_size(&id, size);
        }

        state.sort_versions();
        Ok(())
    }
}

/// Relevance score: substring hits on content and summary, category and tag
/// matches, and a recent-access boost.
fn relevance_score(
    record: &Memory,
    query: &SearchQuery,
    query_lower: &str,
    now: chrono::DateTime<Utc>,
) -> f64 {
    let mut score = 0.0;

    if record.content.to_lowercase().contains(query_lower) {
        score += 1.0;
    }
    if !record.summary.is_empty() && record.summary.to_lowercase().contains(query_lower) {
        score += 0.8;
    }
    if !query.category.is_empty() && record.matches_category(&query.category) {
        score += 0.5;
    }
    if !query.tags.is_empty() && record.has_any_tag(&query.tags) {
        score += 0.3;
    }
    if now - record.last_access < Duration::hours(24) {
        score += 0.1;
    }

    score
}

fn matches_bulk_filter(record: &Memory, options: &BulkDeleteOptions, query_lower: &str) -> bool {
    if !options.category.is_empty() && !record.matches_category(&options.category) {
        return false;
    }
    if !options.tags.is_empty() && !record.has_any_tag(&options.tags) {
        return false;
    }
    if let Some(before) = options.before_date {
        if record.created_at >= before {
            return false;
        }
    }
    if !options.query.is_empty() {
        let content_matches = record.content.to_lowercase().contains(query_lower);
        let summary_matches =
            !record.summary.is_empty() && record.summary.to_lowercase().contains(query_lower);
        if !content_matches && !summary_matches {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::Shared;
    use crate::codec::Codec;
    use crate::error::StoreError;
    use crate::index::IndexSet;
    use crate::model::Memory;
    use chrono::Utc;
    use mnemon_rs_config::StorageConfig;
    use parking_lot::RwLock;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn shared_with_limit(dir: &std::path::Path, max_file_size: u64) -> Shared {
        let config = StorageConfig {
            data_dir: dir.to_path_buf(),
            max_file_size,
            max_storage_size: max_file_size.max(1024 * 1024),
            enable_async: false,
            enable_compression: false,
            ..StorageConfig::default()
        };
        let codec = Codec::new(&config).expect("codec");
        crate::fileio::ensure_layout(&config.data_dir).expect("layout");
        Shared {
            memories_dir: config.data_dir.join(crate::fileio::MEMORIES_DIR),
            codec,
            state: RwLock::new(IndexSet::default()),
            config,
        }
    }

    fn sample_record() -> Memory {
        let now = Utc::now();
        Memory {
            id: "0123456789abcdef-v1".to_string(),
            content: "size boundary probe".to_string(),
            summary: String::new(),
            tags: Vec::new(),
            category: String::new(),
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
            access_count: 0,
            last_access: now,
            version: 1,
            previous_version_id: String::new(),
            is_current_version: true,
            keywords: Vec::new(),
        }
    }

    #[test]
    fn file_at_exactly_the_limit_is_accepted() {
        let temp = tempdir().expect("tempdir");
        let record = sample_record();

        let probe = shared_with_limit(temp.path(), u64::MAX);
        let exact = probe.codec.encode(&record).expect("encode").len() as u64;

        let shared = shared_with_limit(temp.path(), exact);
        assert_eq!(shared.persist(&record).expect("persist"), exact);
    }

    #[test]
    fn file_one_byte_over_the_limit_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let record = sample_record();

        let probe = shared_with_limit(temp.path(), u64::MAX);
        let exact = probe.codec.encode(&record).expect("encode").len() as u64;

        let shared = shared_with_limit(temp.path(), exact - 1);
        match shared.persist(&record) {
            Err(StoreError::SizeLimit { size, limit }) => {
                assert_eq!(size, exact);
                assert_eq!(limit, exact - 1);
            }
            other => panic!("expected SizeLimit, got {other:?}"),
        }
    }
}
