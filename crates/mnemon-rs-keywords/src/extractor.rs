//! Pattern-driven keyword extractor.

use crate::stopwords::{COMMON_WORDS, STOP_WORDS};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Number of keywords returned when no limit is requested.
pub const DEFAULT_KEYWORDS: usize = 10;
/// Hard ceiling on the number of keywords returned.
pub const MAX_KEYWORDS: usize = 50;

/// Minimum term frequency for an unclassified token to qualify as a concept.
const CONCEPT_MIN_TF: f64 = 0.01;

/// Classification assigned to an extracted keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordKind {
    /// Language, framework, infrastructure, database, or file-extension term.
    Technical,
    /// Hyphenated, CamelCase, or dotted identifier.
    Project,
    /// Title-case name, email local part, or @-handle.
    Person,
    /// High-frequency term with no special classification.
    Concept,
}

/// An extracted keyword with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    /// The term as it appeared (technical terms are lowercased).
    pub term: String,
    /// Boosted term-frequency score.
    pub score: f64,
    /// Pattern class the term matched.
    pub kind: KeywordKind,
}

/// Extracts and ranks keywords from free text.
pub struct Extractor {
    stop_words: HashSet<&'static str>,
    technical_patterns: Vec<Regex>,
    project_patterns: Vec<Regex>,
    person_name: Regex,
    email: Regex,
    handle: Regex,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    /// Build an extractor with the fixed pattern families.
    pub fn new() -> Self {
        let technical_patterns = [
            // Programming languages
            r"\b(golang|python|javascript|typescript|java|rust|cpp|c\+\+|ruby|php|swift|kotlin|scala)\b",
            // Frameworks and libraries
            r"\b(react|angular|vue|django|flask|spring|express|nextjs|rails|laravel)\b",
            // Infrastructure
            r"\b(docker|kubernetes|k8s|aws|gcp|azure|terraform|ansible|jenkins|gitlab|github)\b",
            // Databases
            r"\b(postgresql|postgres|mysql|mongodb|redis|elasticsearch|cassandra|dynamodb)\b",
            // Technical concepts
            r"\b(api|rest|graphql|grpc|microservice|serverless|ci/cd|devops|agile|scrum)\b",
            // File names with a recognized extension
            r"\b\w+\.(?:go|py|js|ts|java|rs|cpp|rb|php|swift|kt|json|yaml|yml|xml|html|css|scss|sql)\b",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("technical pattern"))
        .collect();

        let project_patterns = [
            // kebab/snake identifiers
            r"\b[a-zA-Z0-9]+[-_][a-zA-Z0-9]+(?:[-_][a-zA-Z0-9]+)*\b",
            // CamelCase identifiers
            r"\b[A-Z][a-z]+(?:[A-Z][a-z]+)+\b",
            // Dotted package names
            r"\b[a-z]+(?:\.[a-z]+)+\b",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("project pattern"))
        .collect();

        Extractor {
            stop_words: STOP_WORDS.iter().copied().collect(),
            technical_patterns,
            project_patterns,
            person_name: Regex::new(r"\b[A-Z][a-z]+\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?\b")
                .expect("person pattern"),
            email: Regex::new(r"\b([a-zA-Z]+(?:[._-][a-zA-Z]+)*)@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}\b")
                .expect("email pattern"),
            handle: Regex::new(r"@[a-zA-Z0-9][a-zA-Z0-9-]{0,38}").expect("handle pattern"),
        }
    }

    /// Extract up to `max_keywords` ranked keywords from `text`.
    ///
    /// A limit of zero selects [`DEFAULT_KEYWORDS`]; limits above
    /// [`MAX_KEYWORDS`] are clamped.
    pub fn extract(&self, text: &str, max_keywords: usize) -> Vec<Keyword> {
        let limit = match max_keywords {
            0 => DEFAULT_KEYWORDS,
            n => n.min(MAX_KEYWORDS),
        };

        let tf_scores = self.term_frequencies(text);
        let mut keywords: HashMap<String, Keyword> = HashMap::new();

        for term in self.extract_technical_terms(text) {
            let key = term.to_lowercase();
            let score = match tf_scores.get(&key) {
                Some(tf) => tf * 2.0,
                None => 0.5,
            };
            keywords.insert(
                key,
                Keyword {
                    term,
                    score,
                    kind: KeywordKind::Technical,
                },
            );
        }

        for name in self.extract_project_names(text) {
            let key = name.to_lowercase();
            let score = match tf_scores.get(&key) {
                Some(tf) => tf * 1.8,
                None => 0.4,
            };
            self.insert_if_better(&mut keywords, key, name, score, KeywordKind::Project);
        }

        for name in self.extract_person_names(text) {
            let key = name.to_lowercase();
            let score = match tf_scores.get(&key) {
                Some(tf) => tf * 1.5,
                None => 0.3,
            };
            self.insert_if_better(&mut keywords, key, name, score, KeywordKind::Person);
        }

        for (word, tf) in &tf_scores {
            if !keywords.contains_key(word) && *tf > CONCEPT_MIN_TF && is_meaningful_concept(word) {
                keywords.insert(
                    word.clone(),
                    Keyword {
                        term: word.clone(),
                        score: *tf,
                        kind: KeywordKind::Concept,
                    },
                );
            }
        }

        let mut ranked: Vec<Keyword> = keywords
            .into_values()
            .filter(|keyword| keyword.term.len() >= 3)
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.term.cmp(&b.term))
        });
        ranked.truncate(limit);
        ranked
    }

    /// Extract every keyword class up to the hard ceiling.
    pub fn extract_all(&self, text: &str) -> Vec<Keyword> {
        self.extract(text, MAX_KEYWORDS)
    }

    /// Tokenize on non-alphanumeric boundaries, keeping `_`, `-`, and `.`
    /// inside tokens.
    pub(crate) fn tokenize(&self, text: &str) -> Vec<String> {
        let mut words = Vec::new();
        let mut current = String::new();

        for ch in text.chars() {
            if ch.is_alphanumeric() || ch == '_' || ch == '-' || ch == '.' {
                current.push(ch);
            } else if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            words.push(current);
        }

        words
    }

    pub(crate) fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word.to_lowercase().as_str())
    }

    /// Lowercased term frequencies over surviving tokens.
    fn term_frequencies(&self, text: &str) -> HashMap<String, f64> {
        let mut freq: HashMap<String, usize> = HashMap::new();
        let mut total = 0usize;

        for word in self.tokenize(text) {
            if word.len() > 2 && !self.is_stop_word(&word) {
                *freq.entry(word.to_lowercase()).or_insert(0) += 1;
                total += 1;
            }
        }

        freq.into_iter()
            .map(|(word, count)| (word, count as f64 / total as f64))
            .collect()
    }

    fn insert_if_better(
        &self,
        keywords: &mut HashMap<String, Keyword>,
        key: String,
        term: String,
        score: f64,
        kind: KeywordKind,
    ) {
        match keywords.get(&key) {
            Some(existing) if existing.score >= score => {}
            _ => {
                keywords.insert(key, Keyword { term, score, kind });
            }
        }
    }

    fn extract_technical_terms(&self, text: &str) -> HashSet<String> {
        let lowered = text.to_lowercase();
        let mut terms = HashSet::new();
        for pattern in &self.technical_patterns {
            for found in pattern.find_iter(&lowered) {
                terms.insert(found.as_str().to_string());
            }
        }
        terms
    }

    fn extract_project_names(&self, text: &str) -> HashSet<String> {
        let mut names = HashSet::new();
        for pattern in &self.project_patterns {
            for found in pattern.find_iter(text) {
                let name = found.as_str();
                if name.len() > 3 && !is_common_word(name) {
                    names.insert(name.to_string());
                }
            }
        }
        names
    }

    fn extract_person_names(&self, text: &str) -> HashSet<String> {
        let mut names = HashSet::new();
        for found in self.person_name.find_iter(text) {
            names.insert(found.as_str().to_string());
        }
        for captures in self.email.captures_iter(text) {
            if let Some(local) = captures.get(1) {
                let spaced = local
                    .as_str()
                    .replace(['.', '_', '-'], " ");
                names.insert(title_case(&spaced));
            }
        }
        for found in self.handle.find_iter(text) {
            names.insert(found.as_str().to_string());
        }
        names
    }
}

/// A concept must be at least four characters and contain a vowel.
fn is_meaningful_concept(word: &str) -> bool {
    word.len() >= 4 && word.chars().any(|ch| "aeiouAEIOU".contains(ch))
}

fn is_common_word(word: &str) -> bool {
    let lowered = word.to_lowercase();
    COMMON_WORDS.contains(&lowered.as_str())
}

/// Uppercase the first letter of each space-separated word.
fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::{Extractor, KeywordKind};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn kinds_by_term(extractor: &Extractor, text: &str) -> HashMap<String, KeywordKind> {
        extractor
            .extract(text, 10)
            .into_iter()
            .map(|keyword| (keyword.term.to_lowercase(), keyword.kind))
            .collect()
    }

    #[test]
    fn classifies_technical_content() {
        let extractor = Extractor::new();
        let kinds = kinds_by_term(
            &extractor,
            "We're using Golang and PostgreSQL for the backend API. The frontend \
             is built with React and TypeScript. Everything runs on Docker \
             containers in AWS.",
        );

        for term in ["golang", "postgresql", "react", "typescript", "docker", "aws"] {
            assert_eq!(kinds.get(term), Some(&KeywordKind::Technical), "{term}");
        }
    }

    #[test]
    fn classifies_project_names() {
        let extractor = Extractor::new();
        let kinds = kinds_by_term(
            &extractor,
            "The mcp-memory-server project integrates with MyAwesomeApp and \
             handles data from the user-dashboard component.",
        );

        assert_eq!(kinds.get("mcp-memory-server"), Some(&KeywordKind::Project));
        assert_eq!(kinds.get("myawesomeapp"), Some(&KeywordKind::Project));
        assert_eq!(kinds.get("user-dashboard"), Some(&KeywordKind::Project));
    }

    #[test]
    fn classifies_person_names() {
        let extractor = Extractor::new();
        let kinds = kinds_by_term(
            &extractor,
            "John Smith reviewed the PR. Sarah Johnson from the DevOps team \
             helped with deployment. Contact: john.smith@example.com",
        );

        assert_eq!(kinds.get("john smith"), Some(&KeywordKind::Person));
        assert_eq!(kinds.get("sarah johnson"), Some(&KeywordKind::Person));
    }

    #[test]
    fn recognizes_file_names() {
        let extractor = Extractor::new();
        let keywords = extractor.extract(
            "Edit the config.yaml file and update main.go. The styles.scss \
             needs refactoring. Check database.sql for schema.",
            10,
        );
        let terms: Vec<String> = keywords.into_iter().map(|keyword| keyword.term).collect();

        for file in ["config.yaml", "main.go", "styles.scss", "database.sql"] {
            assert!(terms.iter().any(|term| term == file), "missing {file}");
        }
    }

    #[test]
    fn drops_stop_words_and_short_tokens() {
        let extractor = Extractor::new();
        let keywords = extractor.extract(
            "The quick brown fox jumps over the lazy dog and runs through the forest",
            10,
        );

        assert!(!keywords.is_empty());
        for keyword in &keywords {
            assert!(keyword.term.len() >= 3);
            assert!(!extractor.is_stop_word(&keyword.term), "{}", keyword.term);
        }
    }

    #[test]
    fn frequency_and_boost_rank_repeated_technical_terms_first() {
        let extractor = Extractor::new();
        let keywords = extractor.extract(
            "Kubernetes is great. We use kubernetes for deployment. Our \
             kubernetes cluster has many nodes. Docker containers run in the \
             kubernetes environment.",
            5,
        );

        assert_eq!(keywords[0].term, "kubernetes");
        for pair in keywords.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn respects_limit_and_default() {
        let extractor = Extractor::new();
        let text = "Alice Cooper implemented the Python script for data-processor \
                    using Django framework. The script connects to MongoDB and \
                    runs on kubernetes cluster.";

        assert!(extractor.extract(text, 3).len() <= 3);
        assert!(extractor.extract(text, 0).len() <= super::DEFAULT_KEYWORDS);
    }
}
