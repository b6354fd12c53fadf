//! Cache Statistics Module
//!
//! Tracks backend performance metrics including hits, misses, and expirations.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries removed because a read found them expired
    pub expirations: u64,
    /// Current number of entries in the backend
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Expiration ==
    /// Increments the expiration counter.
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
