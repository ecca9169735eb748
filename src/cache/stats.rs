//! Memoization Statistics Module
//!
//! Tracks how a memoized function's cache is performing.

use serde::Serialize;

// == Memo Stats ==
/// Counters for one memoized function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemoStats {
    /// Calls answered from the store
    pub hits: u64,
    /// Calls that looked in the store and found nothing
    pub misses: u64,
    /// Calls that skipped the lookup because a refresh was forced
    pub forced_refreshes: u64,
    /// Computed results that were not written back
    pub skipped_saves: u64,
}

impl MemoStats {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if nothing has been looked up.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_forced_refresh(&mut self) {
        self.forced_refreshes += 1;
    }

    pub fn record_skipped_save(&mut self) {
        self.skipped_saves += 1;
    }
}
