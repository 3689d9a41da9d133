//! Hybrid search fusion
//!
//! Combines lexical (BM25), vector (cosine), and fuzzy (edit distance)
//! candidates into one ranked list. Each source's scores are max-normalized
//! into [0, 1], then fused by a weighted sum; a memory surfacing in several
//! sources accumulates contributions under a single row, never duplicated.

pub mod cache;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::index::ScoredId;
use crate::memory::types::{Memory, MemoryId};

/// Per-source normalized score breakdown for one result
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MatchScores {
    pub lexical: Option<f32>,
    pub vector: Option<f32>,
    pub fuzzy: Option<f32>,
}

/// One hybrid search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub memory: Memory,
    /// Fused score (weighted sum of the normalized per-source scores)
    pub score: f32,
    pub scores: MatchScores,
}

/// A fused candidate before record hydration
#[derive(Debug, Clone, Copy)]
pub struct FusedHit {
    pub id: MemoryId,
    pub score: f32,
    pub scores: MatchScores,
}

/// Typo corrections and prefix suggestions for a query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestResult {
    pub original_query: String,
    /// Set only when at least one word was corrected
    pub corrected_query: Option<String>,
    pub corrections: Vec<Correction>,
    pub suggestions: Vec<String>,
}

/// A single corrected word
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Correction {
    pub original: String,
    pub corrected: String,
}

/// Fuse per-source candidate lists into combined scores.
///
/// The output is unordered; the engine sorts after hydrating records so the
/// updated_at tie-break uses current values.
pub fn fuse(
    lexical: &[ScoredId],
    vector: &[ScoredId],
    fuzzy: &[ScoredId],
    config: &SearchConfig,
) -> Vec<FusedHit> {
    let mut fused: HashMap<MemoryId, FusedHit> = HashMap::new();

    for hit in normalize(lexical) {
        let entry = fused.entry(hit.id).or_insert(FusedHit {
            id: hit.id,
            score: 0.0,
            scores: MatchScores::default(),
        });
        entry.score += hit.score * config.lexical_weight;
        entry.scores.lexical = Some(hit.score);
    }

    for hit in normalize(vector) {
        let entry = fused.entry(hit.id).or_insert(FusedHit {
            id: hit.id,
            score: 0.0,
            scores: MatchScores::default(),
        });
        entry.score += hit.score * config.vector_weight;
        entry.scores.vector = Some(hit.score);
    }

    for hit in normalize(fuzzy) {
        let entry = fused.entry(hit.id).or_insert(FusedHit {
            id: hit.id,
            score: 0.0,
            scores: MatchScores::default(),
        });
        entry.score += hit.score * config.fuzzy_weight;
        entry.scores.fuzzy = Some(hit.score);
    }

    fused.into_values().collect()
}

/// Max-normalize one source's scores into [0, 1]
fn normalize(hits: &[ScoredId]) -> Vec<ScoredId> {
    let max = hits.iter().map(|h| h.score).fold(0.0_f32, f32::max);
    if max <= 0.0 {
        return Vec::new();
    }
    hits.iter()
        .map(|h| ScoredId {
            id: h.id,
            score: h.score / max,
        })
        .collect()
}
