//! BM25 inverted index over memory content
//!
//! Term -> (id -> term frequency) postings with per-document lengths.
//! Mutations re-tokenize and update postings for that id only; there is no
//! global rebuild.

use std::collections::HashMap;

use crate::index::{ScoredId, tokenize, top_k};
use crate::memory::types::MemoryId;

/// BM25 ranking parameters
#[derive(Debug, Clone, Copy)]
pub struct Bm25Params {
    /// Term frequency saturation (default: 1.2)
    pub k1: f32,
    /// Document length normalization (default: 0.75)
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// Incrementally-maintained BM25 inverted index
#[derive(Debug, Default)]
pub struct LexicalIndex {
    /// term -> (memory id -> term frequency)
    postings: HashMap<String, HashMap<MemoryId, u32>>,
    /// memory id -> token count
    doc_lengths: HashMap<MemoryId, u32>,
    /// sum of all document lengths, for average length
    total_length: u64,
    params: Bm25Params,
}

impl LexicalIndex {
    pub fn new(params: Bm25Params) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.doc_lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_lengths.is_empty()
    }

    /// Index (or re-index) a memory's content
    pub fn upsert(&mut self, id: MemoryId, content: &str) {
        self.remove(id);

        let tokens = tokenize(content);
        let length = tokens.len() as u32;

        for token in tokens {
            *self.postings.entry(token).or_default().entry(id).or_insert(0) += 1;
        }

        self.doc_lengths.insert(id, length);
        self.total_length += u64::from(length);
    }

    /// Remove a memory from the index. No-op if absent.
    pub fn remove(&mut self, id: MemoryId) {
        let Some(length) = self.doc_lengths.remove(&id) else {
            return;
        };
        self.total_length -= u64::from(length);

        self.postings.retain(|_, ids| {
            ids.remove(&id);
            !ids.is_empty()
        });
    }

    /// Score candidates for a query with BM25, visible ids only.
    ///
    /// Returns up to `limit` hits with raw (unnormalized) scores, descending.
    pub fn search(
        &self,
        query: &str,
        visible: impl Fn(MemoryId) -> bool,
        limit: usize,
    ) -> Vec<ScoredId> {
        let terms = tokenize(query);
        if terms.is_empty() || self.doc_lengths.is_empty() {
            return Vec::new();
        }

        let doc_count = self.doc_lengths.len() as f32;
        let avg_length = self.total_length as f32 / doc_count;
        let Bm25Params { k1, b } = self.params;

        let mut scores: HashMap<MemoryId, f32> = HashMap::new();
        for term in &terms {
            let Some(ids) = self.postings.get(term) else {
                continue;
            };
            let doc_freq = ids.len() as f32;
            let idf = ((doc_count - doc_freq + 0.5) / (doc_freq + 0.5) + 1.0).ln();

            for (&id, &tf) in ids {
                if !visible(id) {
                    continue;
                }
                let doc_length = *self.doc_lengths.get(&id).unwrap_or(&0) as f32;
                let tf = tf as f32;
                let contribution =
                    idf * (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * doc_length / avg_length));
                *scores.entry(id).or_insert(0.0) += contribution;
            }
        }

        let hits = scores
            .into_iter()
            .map(|(id, score)| ScoredId { id, score })
            .collect();
        top_k(hits, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_visible(_: MemoryId) -> bool {
        true
    }

    #[test]
    fn test_upsert_and_search() {
        let mut index = LexicalIndex::new(Bm25Params::default());
        index.upsert(1, "the quick brown fox");
        index.upsert(2, "a lazy dog sleeps");

        let hits = index.search("quick fox", all_visible, 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
        assert!(hits[0].score > 0.0);
    }

    #[test]
    fn test_more_matching_terms_score_higher() {
        let mut index = LexicalIndex::new(Bm25Params::default());
        index.upsert(1, "rust async runtime internals");
        index.upsert(2, "rust borrow checker");
        index.upsert(3, "python packaging guide");

        let hits = index.search("rust async runtime", all_visible, 10);
        assert_eq!(hits[0].id, 1);
        assert!(hits.iter().any(|h| h.id == 2));
        assert!(!hits.iter().any(|h| h.id == 3));
    }

    #[test]
    fn test_upsert_replaces_previous_content() {
        let mut index = LexicalIndex::new(Bm25Params::default());
        index.upsert(1, "original topic alpha");
        index.upsert(1, "replacement topic beta");

        assert!(index.search("alpha", all_visible, 10).is_empty());
        assert_eq!(index.search("beta", all_visible, 10).len(), 1);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_remove_clears_postings() {
        let mut index = LexicalIndex::new(Bm25Params::default());
        index.upsert(1, "ephemeral entry");
        index.remove(1);

        assert!(index.is_empty());
        assert!(index.search("ephemeral", all_visible, 10).is_empty());
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut index = LexicalIndex::new(Bm25Params::default());
        index.upsert(1, "kept");
        index.remove(99);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_visibility_predicate_filters() {
        let mut index = LexicalIndex::new(Bm25Params::default());
        index.upsert(1, "shared term");
        index.upsert(2, "shared term");

        let hits = index.search("shared", |id| id == 2, 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 2);
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let mut index = LexicalIndex::new(Bm25Params::default());
        index.upsert(1, "content");
        assert!(index.search("", all_visible, 10).is_empty());
        assert!(index.search("   ", all_visible, 10).is_empty());
    }

    #[test]
    fn test_rare_terms_outweigh_common_terms() {
        let mut index = LexicalIndex::new(Bm25Params::default());
        for id in 1..=9 {
            index.upsert(id, "common filler words everywhere");
        }
        index.upsert(10, "common filler words everywhere plus zygote");

        let hits = index.search("zygote", all_visible, 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 10);
    }
}
