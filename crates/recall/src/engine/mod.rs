//! Query coordinator
//!
//! Routes CRUD through the store and keeps every derived index consistent
//! with the record table per mutation; fuses the three search sources into
//! one ranked page. Mutations serialize per id through an async lock map;
//! cross-id operations share no lock. Indexing is synchronous within the
//! mutation, so a write is visible to search as soon as the call returns.
//!
//! All derived state (search indexes, graph, fuzzy vocabulary) is held per
//! tenant: isolation is structural, not a filter bolted onto queries.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::config::SearchConfig;
use crate::embedding::Embedder;
use crate::error::{RecallError, Result};
use crate::graph::MemoryGraph;
use crate::index::fuzzy::FuzzyIndex;
use crate::index::lexical::{Bm25Params, LexicalIndex};
use crate::index::vector::VectorIndex;
use crate::memory::filter::ListFilter;
use crate::memory::types::{
    EdgeType, Memory, MemoryId, MemoryPatch, MemoryType, NewMemory, RelatedMemory, normalize_tags,
    validate_importance,
};
use crate::search::cache::{CacheKey, QueryCache};
use crate::search::{Correction, SearchResult, SuggestResult, fuse};
use crate::storage::{MemoryStore, Page, TenantStats};

/// Per-tenant derived state. Created lazily on first use of a tenant.
struct TenantState {
    lexical: RwLock<LexicalIndex>,
    vector: RwLock<VectorIndex>,
    fuzzy: RwLock<FuzzyIndex>,
    graph: RwLock<MemoryGraph>,
}

impl TenantState {
    fn new(params: Bm25Params) -> Self {
        Self {
            lexical: RwLock::new(LexicalIndex::new(params)),
            vector: RwLock::new(VectorIndex::new()),
            fuzzy: RwLock::new(FuzzyIndex::new()),
            graph: RwLock::new(MemoryGraph::new()),
        }
    }
}

/// The memory engine: store, indexes, graph, and search fusion behind one
/// tenant-scoped API.
pub struct MemoryEngine {
    store: MemoryStore,
    tenants: DashMap<String, Arc<TenantState>>,
    locks: DashMap<MemoryId, Arc<Mutex<()>>>,
    embedder: Box<dyn Embedder>,
    cache: Option<QueryCache>,
    config: SearchConfig,
}

impl MemoryEngine {
    pub fn new(config: SearchConfig, embedder: Box<dyn Embedder>) -> Self {
        let cache = config
            .cache_enabled
            .then(|| QueryCache::new(config.cache_capacity));
        Self {
            store: MemoryStore::new(),
            tenants: DashMap::new(),
            locks: DashMap::new(),
            embedder,
            cache,
            config,
        }
    }

    fn tenant_state(&self, tenant: &str) -> Arc<TenantState> {
        let params = Bm25Params {
            k1: self.config.bm25_k1,
            b: self.config.bm25_b,
        };
        self.tenants
            .entry(tenant.to_string())
            .or_insert_with(|| Arc::new(TenantState::new(params)))
            .clone()
    }

    /// Acquire the per-id mutation lock. Concurrent mutations on the same id
    /// apply in some total order; cross-id mutations proceed independently.
    async fn lock_id(&self, id: MemoryId) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    fn invalidate(&self, tenant: &str) {
        if let Some(ref cache) = self.cache {
            cache.invalidate_tenant(tenant);
        }
    }

    /// Create a memory: validate, embed, then write the record and every
    /// index before returning.
    pub async fn create(&self, tenant: &str, input: NewMemory) -> Result<Memory> {
        let content = input.content.trim().to_string();
        if content.is_empty() {
            return Err(RecallError::InvalidArgument(
                "content must not be empty".to_string(),
            ));
        }
        let memory_type = match input.memory_type.as_deref() {
            Some(raw) => MemoryType::parse(raw)?,
            None => MemoryType::default(),
        };
        validate_importance(input.importance)?;
        let tags = normalize_tags(&input.tags);
        let workspace = input
            .workspace
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty());

        let embedding = self.embedder.embed(&content).await?;

        let now = Utc::now();
        let id = self.store.allocate_id();
        let memory = Memory {
            id,
            tenant: tenant.to_string(),
            content,
            memory_type,
            tags,
            workspace,
            metadata: input.metadata,
            importance: input.importance,
            created_at: now,
            updated_at: now,
        };

        let state = self.tenant_state(tenant);
        let _guard = self.lock_id(id).await;

        self.store.insert(memory.clone());
        state
            .lexical
            .write()
            .expect("lexical index lock poisoned")
            .upsert(id, &memory.content);
        state
            .vector
            .write()
            .expect("vector index lock poisoned")
            .upsert(id, embedding);
        state
            .fuzzy
            .write()
            .expect("fuzzy index lock poisoned")
            .upsert(id, &memory.content, &memory.tags);
        self.invalidate(tenant);

        debug!(id, tenant, "memory created");
        Ok(memory)
    }

    /// Fetch a memory by id, scoped to the tenant
    pub fn get(&self, tenant: &str, id: MemoryId) -> Result<Memory> {
        self.store
            .get(id, tenant)
            .ok_or(RecallError::NotFound(id))
    }

    /// Partial update: only supplied fields change, and only the indexes
    /// covering changed fields are touched.
    pub async fn update(&self, tenant: &str, id: MemoryId, patch: MemoryPatch) -> Result<Memory> {
        let _guard = self.lock_id(id).await;
        let mut memory = self
            .store
            .get(id, tenant)
            .ok_or(RecallError::NotFound(id))?;

        if patch.is_empty() {
            return Ok(memory);
        }

        let mut content_changed = false;
        let mut tags_changed = false;

        if let Some(content) = patch.content {
            let content = content.trim().to_string();
            if content.is_empty() {
                return Err(RecallError::InvalidArgument(
                    "content must not be empty".to_string(),
                ));
            }
            if content != memory.content {
                memory.content = content;
                content_changed = true;
            }
        }
        if let Some(ref raw) = patch.memory_type {
            memory.memory_type = MemoryType::parse(raw)?;
        }
        if let Some(ref tags) = patch.tags {
            let tags = normalize_tags(tags);
            if tags != memory.tags {
                memory.tags = tags;
                tags_changed = true;
            }
        }
        if let Some(workspace) = patch.workspace {
            memory.workspace = workspace
                .map(|w| w.trim().to_string())
                .filter(|w| !w.is_empty());
        }
        if let Some(metadata) = patch.metadata {
            memory.metadata = metadata;
        }
        if let Some(importance) = patch.importance {
            validate_importance(importance)?;
            memory.importance = importance;
        }
        memory.updated_at = Utc::now();

        // Embed before the store write so no index ever sees the new record
        // without its new embedding.
        let embedding = if content_changed {
            Some(self.embedder.embed(&memory.content).await?)
        } else {
            None
        };

        let state = self.tenant_state(tenant);
        self.store.replace(memory.clone());
        if content_changed {
            state
                .lexical
                .write()
                .expect("lexical index lock poisoned")
                .upsert(id, &memory.content);
            state
                .vector
                .write()
                .expect("vector index lock poisoned")
                .upsert(id, embedding.expect("embedding computed for changed content"));
        }
        if content_changed || tags_changed {
            state
                .fuzzy
                .write()
                .expect("fuzzy index lock poisoned")
                .upsert(id, &memory.content, &memory.tags);
        }
        self.invalidate(tenant);

        debug!(id, tenant, content_changed, tags_changed, "memory updated");
        Ok(memory)
    }

    /// Delete a memory: record, all index entries, and every incident edge
    /// go together.
    pub async fn delete(&self, tenant: &str, id: MemoryId) -> Result<()> {
        let guard = self.lock_id(id).await;
        self.store
            .remove(id, tenant)
            .ok_or(RecallError::NotFound(id))?;

        let state = self.tenant_state(tenant);
        state
            .lexical
            .write()
            .expect("lexical index lock poisoned")
            .remove(id);
        state
            .vector
            .write()
            .expect("vector index lock poisoned")
            .remove(id);
        state
            .fuzzy
            .write()
            .expect("fuzzy index lock poisoned")
            .remove(id);
        state
            .graph
            .write()
            .expect("graph lock poisoned")
            .remove_incident(id);
        self.invalidate(tenant);

        // Ids are never reused and every later operation on this id fails
        // NotFound before touching any index, so the lock entry can go.
        drop(guard);
        self.locks.remove(&id);

        debug!(id, tenant, "memory deleted");
        Ok(())
    }

    /// List a tenant's memories, newest first, with offset pagination
    pub fn list(
        &self,
        tenant: &str,
        filter: &ListFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Page> {
        Ok(self.store.list(tenant, filter, limit, offset))
    }

    /// Hybrid search: lexical, vector, and fuzzy sources fused by weighted
    /// sum into one ranked page.
    pub async fn search(
        &self,
        tenant: &str,
        query: &str,
        limit: usize,
        workspace: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RecallError::InvalidArgument(
                "query must not be empty".to_string(),
            ));
        }
        if limit == 0 {
            return Ok(Vec::new());
        }

        let cache_key = CacheKey {
            tenant: tenant.to_string(),
            query: query.to_string(),
            workspace: workspace.map(String::from),
            limit,
        };
        if let Some(ref cache) = self.cache {
            if let Some(results) = cache.get(&cache_key) {
                debug!(tenant, query, "search cache hit");
                return Ok(results);
            }
        }

        let query_embedding = self.embedder.embed(query).await?;
        let state = self.tenant_state(tenant);
        let pool = limit.saturating_mul(self.config.oversample.max(1));
        let visible = |id: MemoryId| self.store.visible_in(id, tenant, workspace);

        let lexical_hits = state
            .lexical
            .read()
            .expect("lexical index lock poisoned")
            .search(query, &visible, pool);
        let vector_hits = state
            .vector
            .read()
            .expect("vector index lock poisoned")
            .search(&query_embedding, &visible, pool);
        let fuzzy_hits = state
            .fuzzy
            .read()
            .expect("fuzzy index lock poisoned")
            .search(query, &visible, pool);

        let fused = fuse(&lexical_hits, &vector_hits, &fuzzy_hits, &self.config);

        let mut results: Vec<SearchResult> = fused
            .into_iter()
            .filter_map(|hit| {
                self.store.get(hit.id, tenant).map(|memory| SearchResult {
                    memory,
                    score: hit.score,
                    scores: hit.scores,
                })
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.memory.updated_at.cmp(&a.memory.updated_at))
                .then_with(|| b.memory.id.cmp(&a.memory.id))
        });
        results.truncate(limit);

        if let Some(ref cache) = self.cache {
            cache.put(cache_key, results.clone());
        }
        Ok(results)
    }

    /// Typo corrections and prefix suggestions from the tenant's vocabulary
    pub fn suggest(&self, tenant: &str, query: &str) -> Result<SuggestResult> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RecallError::InvalidArgument(
                "query must not be empty".to_string(),
            ));
        }

        let state = self.tenant_state(tenant);
        let fuzzy = state.fuzzy.read().expect("fuzzy index lock poisoned");

        let mut corrections = Vec::new();
        let mut corrected_words = Vec::new();
        for word in query.split_whitespace() {
            match fuzzy.correct(word) {
                Some(corrected) => {
                    corrections.push(Correction {
                        original: word.to_string(),
                        corrected: corrected.clone(),
                    });
                    corrected_words.push(corrected);
                }
                None => corrected_words.push(word.to_string()),
            }
        }

        let suggestions = fuzzy.suggest(&query.to_lowercase(), 5);

        Ok(SuggestResult {
            original_query: query.to_string(),
            corrected_query: (!corrections.is_empty()).then(|| corrected_words.join(" ")),
            corrections,
            suggestions,
        })
    }

    /// Create a typed edge. Both endpoints must exist within the tenant;
    /// re-linking the same (from, to, type) is a no-op.
    pub async fn link(
        &self,
        tenant: &str,
        from_id: MemoryId,
        to_id: MemoryId,
        edge_type: EdgeType,
    ) -> Result<bool> {
        let _guards = self.lock_pair(from_id, to_id).await;
        if !self.store.contains(from_id, tenant) {
            return Err(RecallError::NotFound(from_id));
        }
        if !self.store.contains(to_id, tenant) {
            return Err(RecallError::NotFound(to_id));
        }

        let state = self.tenant_state(tenant);
        let created = state
            .graph
            .write()
            .expect("graph lock poisoned")
            .link(from_id, to_id, edge_type, tenant);
        debug!(from_id, to_id, %edge_type, created, "link");
        Ok(created)
    }

    /// Remove exactly one typed edge. Idempotent like `link`: returns
    /// whether an edge was actually removed.
    pub async fn unlink(
        &self,
        tenant: &str,
        from_id: MemoryId,
        to_id: MemoryId,
        edge_type: EdgeType,
    ) -> Result<bool> {
        let _guards = self.lock_pair(from_id, to_id).await;
        if !self.store.contains(from_id, tenant) {
            return Err(RecallError::NotFound(from_id));
        }
        if !self.store.contains(to_id, tenant) {
            return Err(RecallError::NotFound(to_id));
        }

        let state = self.tenant_state(tenant);
        let removed = state
            .graph
            .write()
            .expect("graph lock poisoned")
            .unlink(from_id, to_id, edge_type);
        Ok(removed)
    }

    /// One-hop neighbors in both directions, annotated with edge type and
    /// direction. Depth is fixed at one hop; callers compose longer walks by
    /// repeated calls.
    pub fn related(&self, tenant: &str, id: MemoryId) -> Result<Vec<RelatedMemory>> {
        if !self.store.contains(id, tenant) {
            return Err(RecallError::NotFound(id));
        }

        let state = self.tenant_state(tenant);
        let neighbors = state
            .graph
            .read()
            .expect("graph lock poisoned")
            .neighbors(id);

        neighbors
            .into_iter()
            .map(|(neighbor_id, edge_type, direction)| {
                let memory = self.store.get(neighbor_id, tenant).ok_or_else(|| {
                    RecallError::Internal(format!(
                        "edge references missing memory {neighbor_id}"
                    ))
                })?;
                Ok(RelatedMemory {
                    memory,
                    edge_type,
                    direction,
                })
            })
            .collect()
    }

    /// Aggregate counts for the tenant. No side effects.
    pub fn stats(&self, tenant: &str) -> TenantStats {
        self.store.stats(tenant)
    }

    /// Lock two ids in ascending order so concurrent pair operations cannot
    /// deadlock. A self-edge takes a single lock.
    async fn lock_pair(
        &self,
        a: MemoryId,
        b: MemoryId,
    ) -> (OwnedMutexGuard<()>, Option<OwnedMutexGuard<()>>) {
        if a == b {
            return (self.lock_id(a).await, None);
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first_guard = self.lock_id(first).await;
        let second_guard = self.lock_id(second).await;
        (first_guard, Some(second_guard))
    }
}
