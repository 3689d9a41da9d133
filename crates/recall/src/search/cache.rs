//! Search result cache
//!
//! A bounded LRU over fully-ranked result pages, keyed by the exact request
//! shape. Entries are validated against a per-tenant generation counter the
//! engine bumps on every mutation, so a hit can never serve state from
//! before a write in the same tenant.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use dashmap::DashMap;
use lru::LruCache;

use crate::search::SearchResult;

/// Cache key: the full request shape
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub tenant: String,
    pub query: String,
    pub workspace: Option<String>,
    pub limit: usize,
}

#[derive(Debug, Clone)]
struct CachedPage {
    generation: u64,
    results: Vec<SearchResult>,
}

/// Generation-checked LRU of search result pages
pub struct QueryCache {
    pages: Mutex<LruCache<CacheKey, CachedPage>>,
    generations: DashMap<String, u64>,
}

impl QueryCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        Self {
            pages: Mutex::new(LruCache::new(capacity)),
            generations: DashMap::new(),
        }
    }

    /// Current mutation generation for a tenant
    pub fn generation(&self, tenant: &str) -> u64 {
        self.generations.get(tenant).map(|g| *g).unwrap_or(0)
    }

    /// Invalidate a tenant's cached pages by bumping its generation
    pub fn invalidate_tenant(&self, tenant: &str) {
        *self.generations.entry(tenant.to_string()).or_insert(0) += 1;
    }

    /// Look up a page; stale entries (older generation) are evicted
    pub fn get(&self, key: &CacheKey) -> Option<Vec<SearchResult>> {
        let current = self.generation(&key.tenant);
        let mut pages = self.pages.lock().expect("query cache lock poisoned");
        match pages.get(key) {
            Some(page) if page.generation == current => Some(page.results.clone()),
            Some(_) => {
                pages.pop(key);
                None
            }
            None => None,
        }
    }

    /// Store a freshly computed page under the tenant's current generation
    pub fn put(&self, key: CacheKey, results: Vec<SearchResult>) {
        let generation = self.generation(&key.tenant);
        self.pages
            .lock()
            .expect("query cache lock poisoned")
            .put(key, CachedPage {
                generation,
                results,
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(tenant: &str, query: &str) -> CacheKey {
        CacheKey {
            tenant: tenant.to_string(),
            query: query.to_string(),
            workspace: None,
            limit: 10,
        }
    }

    #[test]
    fn test_miss_then_hit() {
        let cache = QueryCache::new(8);
        let k = key("t1", "rust");

        assert!(cache.get(&k).is_none());
        cache.put(k.clone(), Vec::new());
        assert!(cache.get(&k).is_some());
    }

    #[test]
    fn test_invalidation_evicts_tenant_pages() {
        let cache = QueryCache::new(8);
        let k = key("t1", "rust");
        cache.put(k.clone(), Vec::new());

        cache.invalidate_tenant("t1");
        assert!(cache.get(&k).is_none());
    }

    #[test]
    fn test_invalidation_is_tenant_scoped() {
        let cache = QueryCache::new(8);
        let t1 = key("t1", "rust");
        let t2 = key("t2", "rust");
        cache.put(t1.clone(), Vec::new());
        cache.put(t2.clone(), Vec::new());

        cache.invalidate_tenant("t1");
        assert!(cache.get(&t1).is_none());
        assert!(cache.get(&t2).is_some());
    }

    #[test]
    fn test_distinct_request_shapes_are_distinct_keys() {
        let cache = QueryCache::new(8);
        cache.put(key("t1", "rust"), Vec::new());

        assert!(cache.get(&key("t1", "python")).is_none());
        let mut other_limit = key("t1", "rust");
        other_limit.limit = 5;
        assert!(cache.get(&other_limit).is_none());
    }

    #[test]
    fn test_capacity_bound() {
        let cache = QueryCache::new(2);
        cache.put(key("t1", "a"), Vec::new());
        cache.put(key("t1", "b"), Vec::new());
        cache.put(key("t1", "c"), Vec::new());

        // Oldest entry evicted by LRU policy
        assert!(cache.get(&key("t1", "a")).is_none());
        assert!(cache.get(&key("t1", "c")).is_some());
    }
}
