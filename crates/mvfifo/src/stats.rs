//! Cache statistics tracking

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for cache activity
#[derive(Debug, Default)]
pub struct CacheStats {
    inserts: AtomicU64,
    evictions: AtomicU64,
    resizes: AtomicU64,
}

impl CacheStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an insert
    pub fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `count` evictions
    pub fn record_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a ceiling change
    pub fn record_resize(&self) {
        self.resizes.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total inserts
    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }

    /// Get total evictions
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Get total resizes
    pub fn resizes(&self) -> u64 {
        self.resizes.load(Ordering::Relaxed)
    }

    /// Fraction of inserted records that have since been evicted (0.0 to 1.0)
    pub fn eviction_ratio(&self) -> f64 {
        let inserts = self.inserts();
        if inserts == 0 {
            0.0
        } else {
            self.evictions() as f64 / inserts as f64
        }
    }

    /// Reset all statistics
    pub fn reset(&self) {
        self.inserts.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.resizes.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_basic() {
        let stats = CacheStats::new();

        stats.record_insert();
        stats.record_insert();
        stats.record_insert();
        stats.record_insert();
        stats.record_evictions(3);

        assert_eq!(stats.inserts(), 4);
        assert_eq!(stats.evictions(), 3);
        assert_eq!(stats.eviction_ratio(), 0.75);
    }

    #[test]
    fn test_stats_reset() {
        let stats = CacheStats::new();

        stats.record_insert();
        stats.record_evictions(1);
        stats.record_resize();
        stats.reset();

        assert_eq!(stats.inserts(), 0);
        assert_eq!(stats.evictions(), 0);
        assert_eq!(stats.resizes(), 0);
        assert_eq!(stats.eviction_ratio(), 0.0);
    }
}
