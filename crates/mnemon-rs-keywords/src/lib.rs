//! Keyword extraction for memory content.
//!
//! Classifies terms into technical, project, person, and concept classes and
//! ranks them by boosted term frequency. A TF-IDF helper is provided for
//! cross-document scoring.

mod extractor;
mod stopwords;
mod tfidf;

/// Extractor and the keyword types it produces.
pub use extractor::{Extractor, Keyword, KeywordKind, DEFAULT_KEYWORDS, MAX_KEYWORDS};
/// Corpus-level TF-IDF scoring.
pub use tfidf::calculate_tf_idf;
