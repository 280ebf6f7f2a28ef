//! In-memory index set, rebuilt from disk at startup.
//!
//! Secondary indices hold record ids keyed by lowercased category, tag, and
//! keyword; the version index orders each base's chain. All mutation happens
//! under the store's exclusive lock.

use crate::model::{strip_version, Memory};
use std::collections::{HashMap, HashSet};

#[derive(Default)]
pub(crate) struct IndexSet {
    /// Primary map: versioned id → record.
    records: HashMap<String, Memory>,
    /// Alias map: base id → current versioned id.
    current: HashMap<String, String>,
    /// Lowercased category → record ids.
    categories: HashMap<String, Vec<String>>,
    /// Lowercased tag → record ids.
    tags: HashMap<String, Vec<String>>,
    /// Lowercased keyword → record ids.
    keywords: HashMap<String, Vec<String>>,
    /// Base id → version ids, ascending by version.
    versions: HashMap<String, Vec<String>>,
    /// Record id → on-disk byte size.
    sizes: HashMap<String, u64>,
    total_size: u64,
    /// Record id → insertion sequence, for stable tie-breaks.
    arrival: HashMap<String, u64>,
    next_arrival: u64,
}

impl IndexSet {
    /// Insert a record into the primary map and every secondary index.
    pub(crate) fn insert(&mut self, record: Memory) {
        let id = record.id.clone();
        let base = strip_version(&id).to_string();

        if !record.category.is_empty() {
            push_unique(
                self.categories
                    .entry(record.category.to_lowercase())
                    .or_default(),
                &id,
            );
        }
        for tag in &record.tags {
            push_unique(self.tags.entry(tag.to_lowercase()).or_default(), &id);
        }
        for keyword in &record.keywords {
            push_unique(self.keywords.entry(keyword.to_lowercase()).or_default(), &id);
        }

        push_unique(self.versions.entry(base.clone()).or_default(), &id);
        if record.is_current_version {
            self.current.insert(base, id.clone());
        }

        self.arrival.insert(id.clone(), self.next_arrival);
        self.next_arrival += 1;
        self.records.insert(id, record);
    }

    /// Remove a record from every index, returning it with its last known
    /// on-disk size.
    pub(crate) fn remove(&mut self, id: &str) -> Option<(Memory, u64)> {
        let record = self.records.remove(id)?;
        let base = strip_version(id).to_string();

        if !record.category.is_empty() {
            remove_id(&mut self.categories, &record.category.to_lowercase(), id);
        }
        for tag in &record.tags {
            remove_id(&mut self.tags, &tag.to_lowercase(), id);
        }
        for keyword in &record.keywords {
            remove_id(&mut self.keywords, &keyword.to_lowercase(), id);
        }

        if let Some(version_ids) = self.versions.get_mut(&base) {
            version_ids.retain(|version_id| version_id != id);
            if version_ids.is_empty() {
                self.versions.remove(&base);
            }
        }
        if self.current.get(&base).map(String::as_str) == Some(id) {
            self.current.remove(&base);
        }

        let size = self.sizes.remove(id).unwrap_or(0);
        self.total_size -= size;
        self.arrival.remove(id);
        Some((record, size))
    }

    /// Resolve a versioned id or base alias to the stored versioned id.
    pub(crate) fn resolve_id(&self, id: &str) -> Option<String> {
        if self.records.contains_key(id) {
            return Some(id.to_string());
        }
        self.current.get(id).cloned()
    }

    pub(crate) fn get(&self, id: &str) -> Option<&Memory> {
        self.records.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Memory> {
        self.records.get_mut(id)
    }

    /// Versioned id of the current record for a base, if any.
    pub(crate) fn current_id(&self, base: &str) -> Option<&str> {
        self.current.get(base).map(String::as_str)
    }

    pub(crate) fn records(&self) -> impl Iterator<Item = &Memory> {
        self.records.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    /// Version ids for a base, ascending by version.
    pub(crate) fn versions_of(&self, base: &str) -> &[String] {
        self.versions
            .get(base)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Record ids carrying a keyword (matched case-insensitively).
    pub(crate) fn ids_with_keyword(&self, keyword: &str) -> &[String] {
        self.keywords
            .get(&keyword.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Keyword → record count pairs over the whole index.
    pub(crate) fn keyword_counts(&self) -> impl Iterator<Item = (&str, usize)> {
        self.keywords
            .iter()
            .map(|(keyword, ids)| (keyword.as_str(), ids.len()))
    }

    pub(crate) fn unique_keywords(&self) -> usize {
        self.keywords.len()
    }

    /// Candidate ids for a category/tag filter: the intersection of index
    /// lookups when either is given, `None` (meaning all records) otherwise.
    pub(crate) fn candidates(&self, category: &str, tags: &[String]) -> Option<HashSet<String>> {
        let mut candidates: Option<HashSet<String>> = None;

        if !category.is_empty() {
            let ids = self
                .categories
                .get(&category.to_lowercase())
                .map(|ids| ids.iter().cloned().collect())
                .unwrap_or_default();
            candidates = Some(ids);
        }

        if !tags.is_empty() {
            let mut tagged: HashSet<String> = HashSet::new();
            for tag in tags {
                if let Some(ids) = self.tags.get(&tag.to_lowercase()) {
                    tagged.extend(ids.iter().cloned());
                }
            }
            candidates = Some(match candidates {
                Some(existing) => existing.intersection(&tagged).cloned().collect(),
                None => tagged,
            });
        }

        candidates
    }

    /// Update the recorded on-disk size of a record, adjusting the total.
    pub(crate) fn set_size(&mut self, id: &str, size: u64) {
        let previous = self.sizes.insert(id.to_string(), size).unwrap_or(0);
        self.total_size = self.total_size - previous + size;
    }

    pub(crate) fn total_size(&self) -> u64 {
        self.total_size
    }

    pub(crate) fn arrival(&self, id: &str) -> u64 {
        self.arrival.get(id).copied().unwrap_or(u64::MAX)
    }

    /// Sort every version chain by version number; used after a bulk load.
    pub(crate) fn sort_versions(&mut self) {
        for version_ids in self.versions.values_mut() {
            version_ids.sort_by_key(|id| {
                self.records.get(id).map(|record| record.version).unwrap_or(0)
            });
        }
    }
}

fn push_unique(ids: &mut Vec<String>, id: &str) {
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
    }
}

fn remove_id(index: &mut HashMap<String, Vec<String>>, key: &str, id: &str) {
    if let Some(ids) = index.get_mut(key) {
        ids.retain(|existing| existing != id);
        if ids.is_empty() {
            index.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::IndexSet;
    use crate::model::Memory;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn record(id: &str, category: &str, tags: &[&str], current: bool) -> Memory {
        Memory {
            id: id.to_string(),
            content: format!("content of {id}"),
            summary: String::new(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            category: category.to_string(),
            metadata: HashMap::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            access_count: 0,
            last_access: Utc::now(),
            version: id.rsplit("-v").next().and_then(|v| v.parse().ok()).unwrap_or(1),
            previous_version_id: String::new(),
            is_current_version: current,
            keywords: vec!["shared".to_string()],
        }
    }

    #[test]
    fn insert_populates_all_indices() {
        let mut index = IndexSet::default();
        index.insert(record("abc-v1", "Notes", &["Rust"], true));

        assert_eq!(index.len(), 1);
        assert_eq!(index.resolve_id("abc"), Some("abc-v1".to_string()));
        assert_eq!(index.resolve_id("abc-v1"), Some("abc-v1".to_string()));
        assert_eq!(index.versions_of("abc"), ["abc-v1".to_string()]);
        assert_eq!(index.ids_with_keyword("SHARED"), ["abc-v1".to_string()]);

        let candidates = index.candidates("notes", &[]).expect("candidates");
        assert!(candidates.contains("abc-v1"));
        let candidates = index.candidates("", &["rust".to_string()]).expect("candidates");
        assert!(candidates.contains("abc-v1"));
    }

    #[test]
    fn candidate_intersection_requires_both_filters() {
        let mut index = IndexSet::default();
        index.insert(record("aaa-v1", "notes", &["rust"], true));
        index.insert(record("bbb-v1", "notes", &["python"], true));
        index.insert(record("ccc-v1", "work", &["rust"], true));

        let both = index
            .candidates("notes", &["rust".to_string()])
            .expect("candidates");
        assert_eq!(both.len(), 1);
        assert!(both.contains("aaa-v1"));

        assert!(index.candidates("", &[]).is_none());
    }

    #[test]
    fn remove_unwinds_every_index_and_size() {
        let mut index = IndexSet::default();
        index.insert(record("abc-v1", "notes", &["rust"], true));
        index.set_size("abc-v1", 128);
        assert_eq!(index.total_size(), 128);

        let (removed, size) = index.remove("abc-v1").expect("remove");
        assert_eq!(removed.id, "abc-v1");
        assert_eq!(size, 128);
        assert_eq!(index.total_size(), 0);
        assert_eq!(index.len(), 0);
        assert_eq!(index.resolve_id("abc"), None);
        assert!(index.candidates("notes", &[]).expect("candidates").is_empty());
        assert!(index.ids_with_keyword("shared").is_empty());
        assert!(index.versions_of("abc").is_empty());
    }

    #[test]
    fn supersession_moves_the_alias() {
        let mut index = IndexSet::default();
        index.insert(record("abc-v1", "notes", &[], true));

        if let Some(previous) = index.get_mut("abc-v1") {
            previous.is_current_version = false;
        }
        index.insert(record("abc-v2", "notes", &[], true));

        assert_eq!(index.resolve_id("abc"), Some("abc-v2".to_string()));
        assert_eq!(
            index.versions_of("abc"),
            ["abc-v1".to_string(), "abc-v2".to_string()]
        );
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn size_updates_replace_previous_accounting() {
        let mut index = IndexSet::default();
        index.insert(record("abc-v1", "", &[], true));
        index.set_size("abc-v1", 100);
        index.set_size("abc-v1", 60);
        assert_eq!(index.total_size(), 60);
    }

    #[test]
    fn version_chains_sort_after_load() {
        let mut index = IndexSet::default();
        index.insert(record("abc-v3", "", &[], true));
        index.insert(record("abc-v1", "", &[], false));
        index.insert(record("abc-v2", "", &[], false));
        index.sort_versions();

        assert_eq!(
            index.versions_of("abc"),
            [
                "abc-v1".to_string(),
                "abc-v2".to_string(),
                "abc-v3".to_string()
            ]
        );
    }
}
