//! Test utilities for recall - shared fixtures for unit and integration tests

use std::sync::Arc;

use crate::config::SearchConfig;
use crate::embedding::HashEmbedder;
use crate::engine::MemoryEngine;
use crate::memory::types::NewMemory;

/// Engine with default search config and the deterministic hash embedder
pub fn test_engine() -> MemoryEngine {
    MemoryEngine::new(SearchConfig::default(), Box::new(HashEmbedder::new(384)))
}

/// Engine with a custom search config and the deterministic hash embedder
pub fn test_engine_with_config(config: SearchConfig) -> MemoryEngine {
    MemoryEngine::new(config, Box::new(HashEmbedder::new(384)))
}

/// Shared-state engine for server tests
pub fn test_engine_arc() -> Arc<MemoryEngine> {
    Arc::new(test_engine())
}

/// Minimal create input with just content set
pub fn new_memory(content: &str) -> NewMemory {
    NewMemory {
        content: content.to_string(),
        ..Default::default()
    }
}

/// Create input with content, workspace, and tags
pub fn new_memory_in(content: &str, workspace: &str, tags: &[&str]) -> NewMemory {
    NewMemory {
        content: content.to_string(),
        workspace: Some(workspace.to_string()),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        ..Default::default()
    }
}
