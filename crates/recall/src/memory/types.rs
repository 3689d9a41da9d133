//! Core data model for the Recall memory store
//!
//! Defines the Memory record owned by the store, the typed graph edges
//! between memories, and the input shapes used by create/update.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RecallError, Result};

/// Unique memory identifier. Monotonic, system-wide, never reused.
pub type MemoryId = i64;

/// Memory classification. Open set of short lowercase identifiers
/// ("note", "decision", "preference", ...); "note" is the default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryType(String);

impl MemoryType {
    /// Parse and validate a memory type identifier.
    ///
    /// Identifiers are 1-64 chars from `[a-z0-9_-]`.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() > 64 {
            return Err(RecallError::InvalidArgument(format!(
                "invalid memory type: {raw:?}"
            )));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        {
            return Err(RecallError::InvalidArgument(format!(
                "invalid memory type: {raw:?}"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MemoryType {
    fn default() -> Self {
        Self("note".to_string())
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single memory record. Owned exclusively by the store; indexes hold
/// back-references (ids) only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    /// Unique identifier for this memory
    pub id: MemoryId,
    /// Tenant this memory belongs to
    pub tenant: String,
    /// The actual content of the memory
    pub content: String,
    /// Classification of what kind of memory this is
    pub memory_type: MemoryType,
    /// Tags for categorization (set semantics: sorted, deduplicated)
    pub tags: Vec<String>,
    /// Optional workspace for project-based grouping
    pub workspace: Option<String>,
    /// Arbitrary metadata as key-value pairs
    pub metadata: HashMap<String, serde_json::Value>,
    /// Optional importance score in [0, 1]
    pub importance: Option<f32>,
    /// When this memory was created
    pub created_at: DateTime<Utc>,
    /// When this memory was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a memory. Only `content` is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewMemory {
    pub content: String,
    #[serde(default)]
    pub memory_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub workspace: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub importance: Option<f32>,
}

/// Partial update: `None` fields keep their prior value. For the nullable
/// fields (`workspace`, `importance`), an explicit JSON `null` clears the
/// value while an absent field keeps it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemoryPatch {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub memory_type: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub workspace: Option<Option<String>>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub importance: Option<Option<f32>>,
}

/// Wraps a present field (including an explicit null) in `Some`, so that
/// `Some(None)` means "clear" and `None` means "leave unchanged".
fn present_or_null<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl MemoryPatch {
    /// True when no field is supplied
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.memory_type.is_none()
            && self.tags.is_none()
            && self.workspace.is_none()
            && self.metadata.is_none()
            && self.importance.is_none()
    }
}

/// Normalize a tag list to set semantics: trimmed, non-empty, sorted, deduped.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = tags
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}

/// Validate an importance score, if supplied
pub fn validate_importance(importance: Option<f32>) -> Result<()> {
    if let Some(value) = importance {
        if !(0.0..=1.0).contains(&value) || value.is_nan() {
            return Err(RecallError::InvalidArgument(format!(
                "importance must be in [0, 1], got {value}"
            )));
        }
    }
    Ok(())
}

/// Relation kinds between memories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    RelatedTo,
    Supersedes,
    Contradicts,
    Implements,
    Extends,
    References,
    DependsOn,
    Blocks,
    FollowsUp,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::RelatedTo => "related_to",
            EdgeType::Supersedes => "supersedes",
            EdgeType::Contradicts => "contradicts",
            EdgeType::Implements => "implements",
            EdgeType::Extends => "extends",
            EdgeType::References => "references",
            EdgeType::DependsOn => "depends_on",
            EdgeType::Blocks => "blocks",
            EdgeType::FollowsUp => "follows_up",
        }
    }
}

impl FromStr for EdgeType {
    type Err = RecallError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "related_to" => Ok(EdgeType::RelatedTo),
            "supersedes" => Ok(EdgeType::Supersedes),
            "contradicts" => Ok(EdgeType::Contradicts),
            "implements" => Ok(EdgeType::Implements),
            "extends" => Ok(EdgeType::Extends),
            "references" => Ok(EdgeType::References),
            "depends_on" => Ok(EdgeType::DependsOn),
            "blocks" => Ok(EdgeType::Blocks),
            "follows_up" => Ok(EdgeType::FollowsUp),
            other => Err(RecallError::InvalidArgument(format!(
                "unknown edge type: {other:?}"
            ))),
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed, directed relation between two memories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from_id: MemoryId,
    pub to_id: MemoryId,
    pub edge_type: EdgeType,
    pub tenant: String,
    pub created_at: DateTime<Utc>,
}

/// Direction of an edge relative to the queried memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// A one-hop neighbor of a memory, annotated with how it is connected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedMemory {
    pub memory: Memory,
    pub edge_type: EdgeType,
    pub direction: Direction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_type_default_is_note() {
        assert_eq!(MemoryType::default().as_str(), "note");
    }

    #[test]
    fn test_memory_type_parse_valid() {
        for raw in ["note", "decision", "transcript_chunk", "q3-planning"] {
            assert_eq!(MemoryType::parse(raw).unwrap().as_str(), raw);
        }
    }

    #[test]
    fn test_memory_type_parse_trims_whitespace() {
        assert_eq!(MemoryType::parse("  note ").unwrap().as_str(), "note");
    }

    #[test]
    fn test_memory_type_parse_rejects_invalid() {
        for raw in ["", "   ", "Note", "has space", "ünïcode", &"x".repeat(65)] {
            assert!(MemoryType::parse(raw).is_err(), "should reject {raw:?}");
        }
    }

    #[test]
    fn test_memory_type_serde_transparent() {
        let memory_type = MemoryType::parse("decision").unwrap();
        let json = serde_json::to_string(&memory_type).unwrap();
        assert_eq!(json, "\"decision\"");
        let back: MemoryType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, memory_type);
    }

    #[test]
    fn test_normalize_tags_sorts_and_dedupes() {
        let tags = vec![
            "rust".to_string(),
            "  api ".to_string(),
            "rust".to_string(),
            "".to_string(),
        ];
        assert_eq!(normalize_tags(&tags), vec!["api", "rust"]);
    }

    #[test]
    fn test_validate_importance_range() {
        assert!(validate_importance(None).is_ok());
        assert!(validate_importance(Some(0.0)).is_ok());
        assert!(validate_importance(Some(1.0)).is_ok());
        assert!(validate_importance(Some(-0.1)).is_err());
        assert!(validate_importance(Some(1.1)).is_err());
        assert!(validate_importance(Some(f32::NAN)).is_err());
    }

    #[test]
    fn test_edge_type_roundtrip() {
        for edge_type in [
            EdgeType::RelatedTo,
            EdgeType::Supersedes,
            EdgeType::Contradicts,
            EdgeType::Implements,
            EdgeType::Extends,
            EdgeType::References,
            EdgeType::DependsOn,
            EdgeType::Blocks,
            EdgeType::FollowsUp,
        ] {
            let parsed: EdgeType = edge_type.as_str().parse().unwrap();
            assert_eq!(parsed, edge_type);
        }
    }

    #[test]
    fn test_edge_type_rejects_unknown() {
        assert!("friend_of".parse::<EdgeType>().is_err());
        assert!("".parse::<EdgeType>().is_err());
    }

    #[test]
    fn test_edge_type_serde_snake_case() {
        let json = serde_json::to_string(&EdgeType::DependsOn).unwrap();
        assert_eq!(json, "\"depends_on\"");
    }

    #[test]
    fn test_memory_patch_is_empty() {
        assert!(MemoryPatch::default().is_empty());
        let patch = MemoryPatch {
            content: Some("new".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_memory_patch_nested_option_deserialization() {
        // workspace: null clears the field; absent keeps it
        let patch: MemoryPatch = serde_json::from_str(r#"{"workspace": null}"#).unwrap();
        assert_eq!(patch.workspace, Some(None));

        let patch: MemoryPatch = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(patch.workspace, None);
    }
}
