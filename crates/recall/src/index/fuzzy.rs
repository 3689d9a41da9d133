//! Fuzzy matcher over content tokens and tags
//!
//! Levenshtein-based similarity for queries that miss both the lexical and
//! vector indexes (typos, partial words). Also backs search suggestions and
//! typo correction.

use std::collections::{HashMap, HashSet};

use crate::index::{ScoredId, tokenize, top_k};
use crate::memory::types::MemoryId;

/// Maximum edit distance for a token pair to count as a match
const MAX_EDIT_DISTANCE: usize = 2;

/// Minimum token length considered for fuzzy matching
const MIN_TOKEN_LENGTH: usize = 3;

/// Per-memory token sets plus a corpus vocabulary for suggestions
#[derive(Debug, Default)]
pub struct FuzzyIndex {
    /// memory id -> distinct tokens from content and tags
    tokens: HashMap<MemoryId, Vec<String>>,
    /// token -> number of memories containing it
    vocabulary: HashMap<String, usize>,
}

impl FuzzyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Index (or re-index) a memory's content and tags
    pub fn upsert(&mut self, id: MemoryId, content: &str, tags: &[String]) {
        self.remove(id);

        let mut distinct: HashSet<String> = tokenize(content).into_iter().collect();
        for tag in tags {
            distinct.extend(tokenize(tag));
        }
        distinct.retain(|t| t.len() >= MIN_TOKEN_LENGTH);

        for token in &distinct {
            *self.vocabulary.entry(token.clone()).or_insert(0) += 1;
        }
        self.tokens.insert(id, distinct.into_iter().collect());
    }

    /// Remove a memory from the index. No-op if absent.
    pub fn remove(&mut self, id: MemoryId) {
        let Some(tokens) = self.tokens.remove(&id) else {
            return;
        };
        for token in tokens {
            if let Some(count) = self.vocabulary.get_mut(&token) {
                *count -= 1;
                if *count == 0 {
                    self.vocabulary.remove(&token);
                }
            }
        }
    }

    /// Top-K visible memories by average best-token similarity to the query.
    ///
    /// For each query token the best matching candidate token contributes
    /// `1 - distance / max_len` when within the edit-distance bound; the
    /// memory score is the mean over query tokens.
    pub fn search(
        &self,
        query: &str,
        visible: impl Fn(MemoryId) -> bool,
        limit: usize,
    ) -> Vec<ScoredId> {
        let query_tokens: Vec<String> = tokenize(query)
            .into_iter()
            .filter(|t| t.len() >= MIN_TOKEN_LENGTH)
            .collect();
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let mut hits = Vec::new();
        for (&id, tokens) in &self.tokens {
            if !visible(id) {
                continue;
            }

            let mut total = 0.0;
            for query_token in &query_tokens {
                let best = tokens
                    .iter()
                    .map(|token| token_similarity(query_token, token))
                    .fold(0.0_f32, f32::max);
                total += best;
            }

            let score = total / query_tokens.len() as f32;
            if score > 0.0 {
                hits.push(ScoredId { id, score });
            }
        }

        top_k(hits, limit)
    }

    /// Typo correction: the closest vocabulary word within the edit-distance
    /// bound, preferring smaller distance then higher corpus frequency.
    /// Words already in the vocabulary need no correction.
    pub fn correct(&self, word: &str) -> Option<String> {
        let word = word.to_lowercase();
        if word.len() < MIN_TOKEN_LENGTH || self.vocabulary.contains_key(&word) {
            return None;
        }

        let mut best: Option<(&str, usize, usize)> = None;
        for (candidate, &freq) in &self.vocabulary {
            let distance = levenshtein(&word, candidate);
            if distance > MAX_EDIT_DISTANCE {
                continue;
            }
            match best {
                None => best = Some((candidate, distance, freq)),
                Some((_, best_distance, best_freq)) => {
                    if distance < best_distance
                        || (distance == best_distance && freq > best_freq)
                    {
                        best = Some((candidate, distance, freq));
                    }
                }
            }
        }

        best.map(|(candidate, _, _)| candidate.to_string())
    }

    /// Prefix-based suggestions ranked by corpus frequency
    pub fn suggest(&self, prefix: &str, limit: usize) -> Vec<String> {
        let prefix = prefix.to_lowercase();
        if prefix.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<(&str, usize)> = self
            .vocabulary
            .iter()
            .filter(|(word, _)| word.starts_with(&prefix))
            .map(|(word, &freq)| (word.as_str(), freq))
            .collect();

        matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        matches
            .into_iter()
            .take(limit)
            .map(|(word, _)| word.to_string())
            .collect()
    }
}

/// Similarity of two tokens in [0, 1]; 0 outside the edit-distance bound
fn token_similarity(a: &str, b: &str) -> f32 {
    let distance = levenshtein(a, b);
    if distance > MAX_EDIT_DISTANCE {
        return 0.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 0.0;
    }
    1.0 - distance as f32 / max_len as f32
}

/// Levenshtein distance between two strings (two-row rolling computation)
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut prev_row: Vec<usize> = (0..=b_len).collect();
    let mut curr_row: Vec<usize> = vec![0; b_len + 1];

    for i in 1..=a_len {
        curr_row[0] = i;

        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };

            curr_row[j] = (prev_row[j] + 1)
                .min(curr_row[j - 1] + 1)
                .min(prev_row[j - 1] + cost);
        }

        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b_len]
}
