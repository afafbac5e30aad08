//! Ego-graph memo
//!
//! LRU cache of built ego graphs keyed by center author id. Entries expire
//! after an optional TTL and can be dropped explicitly when an author's papers
//! change.

use super::graph::CoauthorGraph;
use citegraph_common::config::AnalyticsConfig;
use citegraph_common::metrics::record_cache;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

const CACHE_NAME: &str = "ego_graph";

struct CachedGraph {
    graph: Arc<CoauthorGraph>,
    inserted: Instant,
}

/// Bounded, optionally expiring cache of ego graphs
pub struct EgoGraphCache {
    entries: Mutex<LruCache<String, CachedGraph>>,
    ttl: Option<Duration>,
}

impl EgoGraphCache {
    pub fn new(capacity: NonZeroUsize, ttl: Option<Duration>) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Cache sized from configuration; `None` when the capacity is 0.
    ///
    /// A TTL of 0 seconds disables expiry.
    pub fn from_config(config: &AnalyticsConfig) -> Option<Self> {
        let capacity = NonZeroUsize::new(config.ego_cache_capacity)?;
        Some(Self::new(capacity, config.ego_cache_ttl()))
    }

    // A poisoned lock only means a panic mid-update of the LRU order
    fn lock(&self) -> MutexGuard<'_, LruCache<String, CachedGraph>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, entry: &CachedGraph) -> bool {
        self.ttl.is_some_and(|ttl| entry.inserted.elapsed() >= ttl)
    }

    pub fn get(&self, author_id: &str) -> Option<Arc<CoauthorGraph>> {
        let mut entries = self.lock();
        let lookup = entries
            .get(author_id)
            .map(|entry| (self.is_expired(entry), Arc::clone(&entry.graph)));
        let hit = match lookup {
            Some((false, graph)) => Some(graph),
            Some((true, _)) => {
                entries.pop(author_id);
                debug!(author_id, "Ego graph expired");
                None
            }
            None => None,
        };
        record_cache(hit.is_some(), CACHE_NAME);
        hit
    }

    pub fn insert(&self, author_id: &str, graph: Arc<CoauthorGraph>) {
        let entry = CachedGraph {
            graph,
            inserted: Instant::now(),
        };
        self.lock().put(author_id.to_string(), entry);
    }

    /// Drop one author's cached graph; returns whether it was present
    pub fn invalidate(&self, author_id: &str) -> bool {
        self.lock().pop(author_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
