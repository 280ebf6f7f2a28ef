//! Corpus-level TF-IDF scoring built on the extractor's tokenizer.

use crate::extractor::Extractor;
use std::collections::{HashMap, HashSet};

/// Compute TF-IDF scores for every surviving term in every document.
///
/// Returns one score map per document, aligned with the input order. The
/// score for term `t` in document `d` is `tf(t, d) * ln(|D| / df(t))`.
pub fn calculate_tf_idf(documents: &[String]) -> Vec<HashMap<String, f64>> {
    let extractor = Extractor::new();

    let mut doc_freq: HashMap<String, usize> = HashMap::new();
    let mut term_freqs: Vec<HashMap<String, usize>> = Vec::with_capacity(documents.len());

    for document in documents {
        let mut freq: HashMap<String, usize> = HashMap::new();
        let mut seen: HashSet<String> = HashSet::new();

        for word in extractor.tokenize(document) {
            if word.len() > 2 && !extractor.is_stop_word(&word) {
                let lowered = word.to_lowercase();
                *freq.entry(lowered.clone()).or_insert(0) += 1;
                if seen.insert(lowered.clone()) {
                    *doc_freq.entry(lowered).or_insert(0) += 1;
                }
            }
        }

        term_freqs.push(freq);
    }

    let num_docs = documents.len() as f64;
    term_freqs
        .into_iter()
        .map(|freq| {
            let total: usize = freq.values().sum();
            freq.into_iter()
                .map(|(term, count)| {
                    let tf = count as f64 / total as f64;
                    let idf = (num_docs / doc_freq[&term] as f64).ln();
                    (term, tf * idf)
                })
                .collect()
        })
        .collect()
}
