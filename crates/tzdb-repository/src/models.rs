//! Data models for the rule store

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tzdb_core::{VersionTag, ZoneRules};

/// Rules for one zone keyed by dataset version.
///
/// A registry serves a single dataset, so a history returned by the store
/// always holds exactly one entry.
pub type VersionHistory = BTreeMap<VersionTag, Arc<ZoneRules>>;

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to wait for or perform a load
    pub misses: u64,
    /// Resource fetches issued to the provider
    pub fetches: u64,
    /// Loads that ended in an error
    pub failures: u64,
    /// Number of zones in the cache
    pub entries: usize,
}

impl CacheStats {
    /// Calculate cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Lock-free counters behind [`CacheStats`]
#[derive(Debug, Default)]
pub(crate) struct StoreCounters {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub fetches: AtomicU64,
    pub failures: AtomicU64,
    pub entries: AtomicUsize,
}

impl StoreCounters {
    pub fn record(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            entries: self.entries.load(Ordering::Relaxed),
        }
    }
}
