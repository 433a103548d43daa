//! Lookup result cache.
//!
//! # Responsibilities
//! - Remember which node resolved a literal request path
//! - Optionally remember the parameters captured on that path
//! - Count hits and misses
//!
//! # Design Decisions
//! - Keyed by the exact, un-normalized request path
//! - Entries are only added after a fully successful match and never evicted
//! - Concurrent inserts go through a sharded map (`DashMap`)
//! - An optional entry limit stops growth instead of evicting; a new key
//!   must reserve a slot while its shard entry is held, so the limit is exact
//!   under concurrent inserts

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::observability::metrics;
use crate::routing::node::NodeId;
use crate::routing::params::Params;

/// How successful lookups are remembered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// Cache the node only. A hit on a dynamic route yields no parameters.
    #[default]
    Literal,
    /// Cache the node and the captured parameters, replayed on every hit.
    Replay,
    /// Never cache; every lookup walks the tree.
    Off,
}

/// A remembered lookup.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub node: NodeId,
    pub params: Option<Arc<[(Arc<str>, String)]>>,
}

/// Concurrent path → node cache.
#[derive(Debug)]
pub struct RouteCache {
    entries: DashMap<String, CacheEntry>,
    policy: CachePolicy,
    max_entries: Option<usize>,
    reserved: AtomicUsize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RouteCache {
    pub fn new(policy: CachePolicy, max_entries: Option<usize>) -> Self {
        Self {
            entries: DashMap::new(),
            policy,
            max_entries,
            reserved: AtomicUsize::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Look up a previously resolved path.
    pub fn get(&self, path: &str) -> Option<CacheEntry> {
        if self.policy == CachePolicy::Off {
            return None;
        }

        match self.entries.get(path) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::record_cache_lookup(true);
                Some(entry.value().clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                metrics::record_cache_lookup(false);
                None
            }
        }
    }

    /// Remember that `path` resolved to `node`.
    pub fn insert(&self, path: &str, node: NodeId, params: Option<&Params>) {
        if self.policy == CachePolicy::Off {
            return;
        }

        let params = match self.policy {
            CachePolicy::Replay => params.map(|p| Arc::from(p.to_pairs())),
            _ => None,
        };
        let entry = CacheEntry { node, params };

        match self.entries.entry(path.to_string()) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(entry);
            }
            Entry::Vacant(vacant) => {
                if !self.reserve_slot() {
                    tracing::trace!(path = %path, "Route cache full, not caching");
                    return;
                }
                tracing::trace!(path = %path, node = node.index(), "Caching route lookup");
                vacant.insert(entry);
            }
        }
    }

    fn reserve_slot(&self) -> bool {
        let Some(max) = self.max_entries else {
            self.reserved.fetch_add(1, Ordering::Relaxed);
            return true;
        };
        self.reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < max).then_some(n + 1))
            .is_ok()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl Default for RouteCache {
    fn default() -> Self {
        Self::new(CachePolicy::default(), None)
    }
}
