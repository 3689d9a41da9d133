//! Directed, typed-edge adjacency over memory ids
//!
//! Edge lifecycle is tied to the endpoint memories: deleting a memory removes
//! every incident edge. Tenant checks on endpoints happen in the engine; the
//! graph itself only stores and traverses edges.

use std::collections::HashMap;

use chrono::Utc;

use crate::memory::types::{Direction, Edge, EdgeType, MemoryId};

/// In-memory adjacency store with both edge directions materialized
#[derive(Debug, Default)]
pub struct MemoryGraph {
    outgoing: HashMap<MemoryId, Vec<Edge>>,
    incoming: HashMap<MemoryId, Vec<Edge>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of edges
    pub fn edge_count(&self) -> usize {
        self.outgoing.values().map(Vec::len).sum()
    }

    /// Create an edge. Duplicate (from, to, type) is a no-op.
    ///
    /// Returns true when a new edge was created.
    pub fn link(
        &mut self,
        from_id: MemoryId,
        to_id: MemoryId,
        edge_type: EdgeType,
        tenant: &str,
    ) -> bool {
        let exists = self
            .outgoing
            .get(&from_id)
            .is_some_and(|edges| {
                edges
                    .iter()
                    .any(|e| e.to_id == to_id && e.edge_type == edge_type)
            });
        if exists {
            return false;
        }

        let edge = Edge {
            from_id,
            to_id,
            edge_type,
            tenant: tenant.to_string(),
            created_at: Utc::now(),
        };
        self.outgoing.entry(from_id).or_default().push(edge.clone());
        self.incoming.entry(to_id).or_default().push(edge);
        true
    }

    /// Remove exactly the named edge. Returns true when it existed.
    pub fn unlink(&mut self, from_id: MemoryId, to_id: MemoryId, edge_type: EdgeType) -> bool {
        let Some(edges) = self.outgoing.get_mut(&from_id) else {
            return false;
        };
        let before = edges.len();
        edges.retain(|e| !(e.to_id == to_id && e.edge_type == edge_type));
        let removed = edges.len() < before;
        if edges.is_empty() {
            self.outgoing.remove(&from_id);
        }

        if removed {
            if let Some(edges) = self.incoming.get_mut(&to_id) {
                edges.retain(|e| !(e.from_id == from_id && e.edge_type == edge_type));
                if edges.is_empty() {
                    self.incoming.remove(&to_id);
                }
            }
        }
        removed
    }

    /// Remove every edge incident to a memory (delete cascade)
    pub fn remove_incident(&mut self, id: MemoryId) {
        if let Some(edges) = self.outgoing.remove(&id) {
            for edge in edges {
                if let Some(incoming) = self.incoming.get_mut(&edge.to_id) {
                    incoming.retain(|e| e.from_id != id);
                    if incoming.is_empty() {
                        self.incoming.remove(&edge.to_id);
                    }
                }
            }
        }
        if let Some(edges) = self.incoming.remove(&id) {
            for edge in edges {
                if let Some(outgoing) = self.outgoing.get_mut(&edge.from_id) {
                    outgoing.retain(|e| e.to_id != id);
                    if outgoing.is_empty() {
                        self.outgoing.remove(&edge.from_id);
                    }
                }
            }
        }
    }

    /// One-hop neighbors in both directions: (neighbor id, edge type, direction)
    pub fn neighbors(&self, id: MemoryId) -> Vec<(MemoryId, EdgeType, Direction)> {
        let mut result = Vec::new();
        if let Some(edges) = self.outgoing.get(&id) {
            for edge in edges {
                result.push((edge.to_id, edge.edge_type, Direction::Outgoing));
            }
        }
        if let Some(edges) = self.incoming.get(&id) {
            for edge in edges {
                result.push((edge.from_id, edge.edge_type, Direction::Incoming));
            }
        }
        result
    }
}
