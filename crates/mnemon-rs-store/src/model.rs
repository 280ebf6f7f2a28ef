//! Record model and operation inputs/outputs.

use chrono::{DateTime, Duration, Local, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Number of hex digits of the content hash used as the base id.
const BASE_ID_LEN: usize = 16;
/// Number of days covered by the creation timeline.
const TIMELINE_DAYS: i64 = 30;

/// A stored memory record.
///
/// The `id` is `<base>-v<N>` where `<base>` is the first 16 hex digits of the
/// SHA-256 of the content and `N` is the version number. Exactly one record
/// per base is the current version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub access_count: u64,
    pub last_access: DateTime<Utc>,
    pub version: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub previous_version_id: String,
    pub is_current_version: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl Memory {
    /// Base id shared by every version of this record.
    pub fn base_id(&self) -> &str {
        strip_version(&self.id)
    }

    /// True when any of `tags` matches one of the record's tags,
    /// case-insensitively.
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter()
            .any(|query| self.tags.iter().any(|tag| tag.eq_ignore_ascii_case(query)))
    }

    /// True when the record's category matches, case-insensitively.
    pub fn matches_category(&self, category: &str) -> bool {
        self.category.eq_ignore_ascii_case(category)
    }
}

/// First 16 hex digits of the SHA-256 of the content bytes.
pub fn content_base_id(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    digest
        .iter()
        .take(BASE_ID_LEN / 2)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// `<base>-v<N>` filename stem for a version.
pub(crate) fn versioned_id(base: &str, version: u32) -> String {
    format!("{base}-v{version}")
}

/// Strip a trailing `-vN` suffix, returning the base id.
pub fn strip_version(id: &str) -> &str {
    match id.rfind("-v") {
        Some(idx) => &id[..idx],
        None => id,
    }
}

/// A search request against the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Substring matched against content and summary, case-insensitively.
    pub query: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub limit: usize,
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

/// Predicates for bulk deletion. At least one filter must be set and
/// `confirm` must be true.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkDeleteOptions {
    /// Match records with this category.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,
    /// Match records carrying at least one of these tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Match records created before this instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_date: Option<DateTime<Utc>>,
    /// Match records whose content or summary contains this text.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub query: String,
    /// Must be set to actually delete.
    #[serde(default)]
    pub confirm: bool,
}

impl BulkDeleteOptions {
    /// True when no predicate is present.
    pub fn is_empty(&self) -> bool {
        self.category.is_empty()
            && self.tags.is_empty()
            && self.before_date.is_none()
            && self.query.is_empty()
    }
}

/// Aggregate statistics over the store.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total_memories: usize,
    pub total_access_count: u64,
    /// Record count per (verbatim) category.
    pub categories: HashMap<String, usize>,
    pub data_directory: String,
    pub total_size: u64,
    pub max_storage_size: u64,
    pub storage_used_pct: f64,
    pub unique_keywords: usize,
}

/// A keyword with the number of records carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: usize,
}

/// Per-day record creation counts over the last 30 local calendar days,
/// oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timeline {
    pub labels: Vec<String>,
    #[serde(rename = "data")]
    pub counts: Vec<usize>,
}

impl Timeline {
    /// Bucket creation timestamps by local calendar day.
    pub(crate) fn from_records<'a>(records: impl Iterator<Item = &'a Memory>) -> Self {
        let today = Local::now().date_naive();
        let days: Vec<_> = (0..TIMELINE_DAYS)
            .rev()
            .map(|offset| today - Duration::days(offset))
            .collect();

        let labels = days.iter().map(|day| day.format("%b %-d").to_string()).collect();
        let mut counts = vec![0usize; days.len()];
        for record in records {
            let created = record.created_at.with_timezone(&Local).date_naive();
            if let Some(slot) = days.iter().position(|day| *day == created) {
                counts[slot] += 1;
            }
        }

        Timeline { labels, counts }
    }
}

#[cfg(test)]
mod tests {
    use super::{content_base_id, strip_version, versioned_id, Memory};
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn base_id_is_sixteen_hex_digits_of_content_hash() {
        let base = content_base_id("hello");
        assert_eq!(base.len(), 16);
        // sha256("hello") = 2cf24dba5fb0a30e...
        assert_eq!(base, "2cf24dba5fb0a30e");
        assert_eq!(content_base_id("hello"), base);
        assert_ne!(content_base_id("hello!"), base);
    }

    #[test]
    fn version_suffix_round_trips() {
        let id = versioned_id("2cf24dba5fb0a30e", 3);
        assert_eq!(id, "2cf24dba5fb0a30e-v3");
        assert_eq!(strip_version(&id), "2cf24dba5fb0a30e");
        assert_eq!(strip_version("2cf24dba5fb0a30e"), "2cf24dba5fb0a30e");
    }

    #[test]
    fn tag_matching_is_case_insensitive() {
        let record = Memory {
            id: "abc-v1".to_string(),
            content: "content".to_string(),
            summary: String::new(),
            tags: vec!["Rust".to_string(), "storage".to_string()],
            category: "Notes".to_string(),
            metadata: HashMap::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            access_count: 0,
            last_access: Utc::now(),
            version: 1,
            previous_version_id: String::new(),
            is_current_version: true,
            keywords: Vec::new(),
        };

        assert!(record.has_any_tag(&["RUST".to_string()]));
        assert!(!record.has_any_tag(&["python".to_string()]));
        assert!(record.matches_category("notes"));
    }

    #[test]
    fn serialization_omits_empty_optionals() {
        let record = Memory {
            id: "abc-v1".to_string(),
            content: "content".to_string(),
            summary: String::new(),
            tags: Vec::new(),
            category: String::new(),
            metadata: HashMap::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            access_count: 0,
            last_access: Utc::now(),
            version: 1,
            previous_version_id: String::new(),
            is_current_version: true,
            keywords: Vec::new(),
        };

        let json = serde_json::to_string(&record).expect("serialize");
        assert!(!json.contains("summary"));
        assert!(!json.contains("tags"));
        assert!(!json.contains("previous_version_id"));

        let parsed: Memory = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, record);
    }
}
