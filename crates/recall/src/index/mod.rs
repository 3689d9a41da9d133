//! Derived search indexes
//!
//! Each index holds back-references (memory ids) plus whatever it needs to
//! score, never full copies of mutable record fields. Indexes are updated
//! incrementally per id by the engine; queries take a caller-supplied
//! visibility predicate so tenant/workspace scoping happens in one place.

pub mod fuzzy;
pub mod lexical;
pub mod vector;

use crate::memory::types::MemoryId;

/// A raw per-source candidate: memory id plus an unnormalized score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredId {
    pub id: MemoryId,
    pub score: f32,
}

/// Tokenize text into lowercase alphanumeric words
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Sort candidates by score descending (stable on id descending) and truncate
pub(crate) fn top_k(mut hits: Vec<ScoredId>, limit: usize) -> Vec<ScoredId> {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.id.cmp(&a.id))
    });
    hits.truncate(limit);
    hits
}
