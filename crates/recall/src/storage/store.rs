//! Keyed record table for memories
//!
//! DashMap-backed table with monotonic id allocation (ids are system-wide
//! unique and never reused) plus secondary equality indexes over tenant,
//! workspace, memory type, and tags used to narrow `list` scans.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::memory::filter::ListFilter;
use crate::memory::types::{Memory, MemoryId};

/// A page of list results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub memories: Vec<Memory>,
    /// Total matches before pagination
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Aggregate counts for one tenant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantStats {
    pub count: usize,
    pub by_type: HashMap<String, usize>,
    pub by_workspace: HashMap<String, usize>,
}

/// Secondary equality indexes. Keys carry the tenant so lookups never cross
/// the isolation boundary.
#[derive(Debug, Default)]
struct SecondaryIndex {
    by_tenant: HashMap<String, HashSet<MemoryId>>,
    by_workspace: HashMap<(String, String), HashSet<MemoryId>>,
    by_type: HashMap<(String, String), HashSet<MemoryId>>,
    by_tag: HashMap<(String, String), HashSet<MemoryId>>,
}

impl SecondaryIndex {
    fn insert(&mut self, memory: &Memory) {
        let tenant = memory.tenant.clone();
        self.by_tenant
            .entry(tenant.clone())
            .or_default()
            .insert(memory.id);
        if let Some(ref workspace) = memory.workspace {
            self.by_workspace
                .entry((tenant.clone(), workspace.clone()))
                .or_default()
                .insert(memory.id);
        }
        self.by_type
            .entry((tenant.clone(), memory.memory_type.as_str().to_string()))
            .or_default()
            .insert(memory.id);
        for tag in &memory.tags {
            self.by_tag
                .entry((tenant.clone(), tag.clone()))
                .or_default()
                .insert(memory.id);
        }
    }

    fn remove(&mut self, memory: &Memory) {
        let tenant = &memory.tenant;
        prune(&mut self.by_tenant, tenant.clone(), memory.id);
        if let Some(ref workspace) = memory.workspace {
            prune(
                &mut self.by_workspace,
                (tenant.clone(), workspace.clone()),
                memory.id,
            );
        }
        prune(
            &mut self.by_type,
            (tenant.clone(), memory.memory_type.as_str().to_string()),
            memory.id,
        );
        for tag in &memory.tags {
            prune(&mut self.by_tag, (tenant.clone(), tag.clone()), memory.id);
        }
    }

    /// Candidate id set for a filter; the whole tenant when no indexed
    /// condition is set
    fn candidates(&self, tenant: &str, filter: &ListFilter) -> HashSet<MemoryId> {
        let mut sets: Vec<&HashSet<MemoryId>> = Vec::new();

        if let Some(ref workspace) = filter.workspace {
            match self
                .by_workspace
                .get(&(tenant.to_string(), workspace.clone()))
            {
                Some(set) => sets.push(set),
                None => return HashSet::new(),
            }
        }
        if let Some(ref memory_type) = filter.memory_type {
            match self
                .by_type
                .get(&(tenant.to_string(), memory_type.as_str().to_string()))
            {
                Some(set) => sets.push(set),
                None => return HashSet::new(),
            }
        }
        if let Some(ref tags) = filter.tags {
            for tag in tags {
                match self.by_tag.get(&(tenant.to_string(), tag.clone())) {
                    Some(set) => sets.push(set),
                    None => return HashSet::new(),
                }
            }
        }

        if sets.is_empty() {
            return self.by_tenant.get(tenant).cloned().unwrap_or_default();
        }

        // Intersect starting from the smallest set
        sets.sort_by_key(|s| s.len());
        let (first, rest) = sets.split_first().expect("sets is non-empty");
        first
            .iter()
            .filter(|id| rest.iter().all(|s| s.contains(id)))
            .copied()
            .collect()
    }
}

fn prune<K: std::hash::Hash + Eq>(
    index: &mut HashMap<K, HashSet<MemoryId>>,
    key: K,
    id: MemoryId,
) {
    if let Some(set) = index.get_mut(&key) {
        set.remove(&id);
        if set.is_empty() {
            index.remove(&key);
        }
    }
}

/// Durable-in-process keyed record table
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<MemoryId, Memory>,
    secondary: RwLock<SecondaryIndex>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            secondary: RwLock::new(SecondaryIndex::default()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Allocate the next memory id. Ids are never reused, even after delete.
    pub fn allocate_id(&self) -> MemoryId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Total number of records across all tenants
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert a freshly created record
    pub fn insert(&self, memory: Memory) {
        self.secondary
            .write()
            .expect("secondary index lock poisoned")
            .insert(&memory);
        self.records.insert(memory.id, memory);
    }

    /// Replace an existing record with an updated version of itself
    pub fn replace(&self, memory: Memory) {
        if let Some(previous) = self.records.get(&memory.id) {
            let mut secondary = self
                .secondary
                .write()
                .expect("secondary index lock poisoned");
            secondary.remove(&previous);
            secondary.insert(&memory);
        }
        self.records.insert(memory.id, memory);
    }

    /// Fetch a record, scoped to the caller's tenant
    pub fn get(&self, id: MemoryId, tenant: &str) -> Option<Memory> {
        self.records
            .get(&id)
            .filter(|m| m.tenant == tenant)
            .map(|m| m.clone())
    }

    /// Whether a record exists within the tenant
    pub fn contains(&self, id: MemoryId, tenant: &str) -> bool {
        self.records
            .get(&id)
            .is_some_and(|m| m.tenant == tenant)
    }

    /// Search visibility check: tenant match plus optional workspace equality,
    /// without cloning the record
    pub fn visible_in(&self, id: MemoryId, tenant: &str, workspace: Option<&str>) -> bool {
        self.records.get(&id).is_some_and(|m| {
            m.tenant == tenant
                && workspace.is_none_or(|ws| m.workspace.as_deref() == Some(ws))
        })
    }

    /// Remove a record, scoped to the caller's tenant
    pub fn remove(&self, id: MemoryId, tenant: &str) -> Option<Memory> {
        let owned = self
            .records
            .get(&id)
            .is_some_and(|m| m.tenant == tenant);
        if !owned {
            return None;
        }
        let (_, memory) = self.records.remove(&id)?;
        self.secondary
            .write()
            .expect("secondary index lock poisoned")
            .remove(&memory);
        Some(memory)
    }

    /// List a tenant's memories, newest first (created_at desc, id desc),
    /// with offset pagination. Deterministic across calls absent mutation.
    pub fn list(&self, tenant: &str, filter: &ListFilter, limit: usize, offset: usize) -> Page {
        let candidates = self
            .secondary
            .read()
            .expect("secondary index lock poisoned")
            .candidates(tenant, filter);

        let mut matches: Vec<Memory> = candidates
            .into_iter()
            .filter_map(|id| self.records.get(&id).map(|m| m.clone()))
            .filter(|m| m.tenant == tenant && filter.matches(m))
            .collect();

        matches.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let total = matches.len();
        let memories: Vec<Memory> = matches.into_iter().skip(offset).take(limit).collect();

        Page {
            memories,
            total,
            limit,
            offset,
        }
    }

    /// Aggregate counts for one tenant. No side effects.
    pub fn stats(&self, tenant: &str) -> TenantStats {
        let ids = self
            .secondary
            .read()
            .expect("secondary index lock poisoned")
            .by_tenant
            .get(tenant)
            .cloned()
            .unwrap_or_default();

        let mut stats = TenantStats::default();
        for id in ids {
            let Some(memory) = self.records.get(&id) else {
                continue;
            };
            stats.count += 1;
            *stats
                .by_type
                .entry(memory.memory_type.as_str().to_string())
                .or_insert(0) += 1;
            if let Some(ref workspace) = memory.workspace {
                *stats.by_workspace.entry(workspace.clone()).or_insert(0) += 1;
            }
        }
        stats
    }
}
