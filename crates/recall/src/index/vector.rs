//! Vector index over memory embeddings
//!
//! Holds one embedding per memory and answers exact top-K cosine queries.
//! The contract fixes the similarity metric and result ordering, not the
//! data structure; an exact scan keeps the index trivially consistent under
//! per-id mutation.

use std::collections::HashMap;

use crate::index::{ScoredId, top_k};
use crate::memory::types::MemoryId;

/// Exact-scan cosine similarity index
#[derive(Debug, Default)]
pub struct VectorIndex {
    embeddings: HashMap<MemoryId, Vec<f32>>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Insert or replace the embedding for a memory
    pub fn upsert(&mut self, id: MemoryId, embedding: Vec<f32>) {
        self.embeddings.insert(id, embedding);
    }

    /// Remove a memory's embedding. No-op if absent.
    pub fn remove(&mut self, id: MemoryId) {
        self.embeddings.remove(&id);
    }

    /// Top-K visible ids by cosine similarity to the query embedding.
    ///
    /// Negative similarities are clamped to zero so downstream score fusion
    /// stays in [0, 1] after normalization.
    pub fn search(
        &self,
        query: &[f32],
        visible: impl Fn(MemoryId) -> bool,
        limit: usize,
    ) -> Vec<ScoredId> {
        let hits: Vec<ScoredId> = self
            .embeddings
            .iter()
            .filter(|&(&id, _)| visible(id))
            .map(|(&id, embedding)| ScoredId {
                id,
                score: cosine_similarity(query, embedding).max(0.0),
            })
            .filter(|hit| hit.score > 0.0)
            .collect();
        top_k(hits, limit)
    }
}

/// Cosine similarity between two vectors, clamped to [-1, 1].
/// Mismatched or empty vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_visible(_: MemoryId) -> bool {
        true
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let v = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let v1 = vec![1.0, 0.0, 0.0];
        let v2 = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&v1, &v2).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let v1 = vec![1.0, 0.0];
        let v2 = vec![-1.0, 0.0];
        assert!((cosine_similarity(&v1, &v2) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_mismatched_or_empty() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let mut index = VectorIndex::new();
        index.upsert(1, vec![1.0, 0.0, 0.0]);
        index.upsert(2, vec![0.9, 0.1, 0.0]);
        index.upsert(3, vec![0.0, 1.0, 0.0]);

        let hits = index.search(&[1.0, 0.0, 0.0], all_visible, 10);
        assert_eq!(hits[0].id, 1);
        assert_eq!(hits[1].id, 2);
        // Orthogonal vector clamps to 0 and is dropped
        assert!(!hits.iter().any(|h| h.id == 3));
    }

    #[test]
    fn test_search_clamps_negative_similarity() {
        let mut index = VectorIndex::new();
        index.upsert(1, vec![-1.0, 0.0]);

        let hits = index.search(&[1.0, 0.0], all_visible, 10);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_search_respects_limit_and_visibility() {
        let mut index = VectorIndex::new();
        for id in 1..=5 {
            index.upsert(id, vec![1.0, id as f32 * 0.01]);
        }

        let hits = index.search(&[1.0, 0.0], |id| id != 1, 2);
        assert_eq!(hits.len(), 2);
        assert!(!hits.iter().any(|h| h.id == 1));
    }

    #[test]
    fn test_upsert_replaces_embedding() {
        let mut index = VectorIndex::new();
        index.upsert(1, vec![1.0, 0.0]);
        index.upsert(1, vec![0.0, 1.0]);
        assert_eq!(index.len(), 1);

        let hits = index.search(&[0.0, 1.0], all_visible, 10);
        assert_eq!(hits[0].id, 1);
        assert!((hits[0].score - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_remove() {
        let mut index = VectorIndex::new();
        index.upsert(1, vec![1.0]);
        index.remove(1);
        assert!(index.is_empty());
        index.remove(1);
    }
}
