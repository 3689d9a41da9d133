//! Filter types for memory listing
//!
//! An explicit filter struct with documented defaults instead of a
//! loosely-typed bag of named arguments. All fields are optional - when
//! `None`, that filter is not applied. Multiple filters combine with AND.

use crate::memory::types::{Memory, MemoryType};

/// Filter criteria for `memory_list`.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Workspace equality filter
    pub workspace: Option<String>,
    /// Memory type equality filter
    pub memory_type: Option<MemoryType>,
    /// Tag subset filter: a memory must carry every listed tag
    pub tags: Option<Vec<String>>,
}

impl ListFilter {
    /// Create a new empty filter (no filtering applied)
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by workspace
    pub fn with_workspace(mut self, workspace: String) -> Self {
        self.workspace = Some(workspace);
        self
    }

    /// Filter by memory type
    pub fn with_memory_type(mut self, memory_type: MemoryType) -> Self {
        self.memory_type = Some(memory_type);
        self
    }

    /// Filter by required tags (subset match)
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Check if this filter is empty (no conditions set)
    pub fn is_empty(&self) -> bool {
        self.workspace.is_none() && self.memory_type.is_none() && self.tags.is_none()
    }

    /// Whether a memory satisfies every set condition
    pub fn matches(&self, memory: &Memory) -> bool {
        if let Some(ref workspace) = self.workspace {
            if memory.workspace.as_deref() != Some(workspace.as_str()) {
                return false;
            }
        }
        if let Some(ref memory_type) = self.memory_type {
            if memory.memory_type != *memory_type {
                return false;
            }
        }
        if let Some(ref tags) = self.tags {
            if !tags.iter().all(|t| memory.tags.iter().any(|m| m == t)) {
                return false;
            }
        }
        true
    }
}
