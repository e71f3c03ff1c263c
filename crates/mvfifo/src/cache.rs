//! MvFifoCache: thread-safe multi-value FIFO cache

use std::iter::FusedIterator;
use bytes::Bytes;
use parking_lot::{RwLock, RwLockReadGuard};
use tracing::{debug, trace, warn};

use crate::chain::{footprint, Chains};
use crate::config::CacheConfig;
use crate::stats::CacheStats;

/// Size-bounded cache holding an ordered run of `(cursor, value)` records per key.
///
/// Eviction is strictly oldest-first across all keys. Cursors must increase
/// within a key; this is checked only in debug builds.
pub struct MvFifoCache {
    /// Both chains, the size accountant and the ceiling
    chains: RwLock<Chains>,

    /// Cache statistics
    stats: CacheStats,
}

impl MvFifoCache {
    /// Create an empty cache with the default 256 MiB ceiling
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create an empty cache from `config`
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            chains: RwLock::new(Chains::new(config.max_size())),
            stats: CacheStats::new(),
        }
    }

    /// Append a record under `key`, then evict the oldest records until the
    /// cache fits its ceiling.
    ///
    /// Never rejects a record. One larger than the ceiling is admitted and
    /// evicted along with everything else.
    pub fn add(&self, key: &str, cursor: u64, value: impl Into<Bytes>) {
        let value = value.into();
        let cost = footprint(key, &value);

        let mut chains = self.chains.write();
        if cost > chains.max_size() {
            warn!(key, cost, max_size = chains.max_size(), "record exceeds cache ceiling");
        }
        chains.push(key, cursor, value);
        let evicted = chains.evict_to_fit();
        drop(chains);

        self.stats.record_insert();
        if evicted > 0 {
            self.stats.record_evictions(evicted as u64);
            trace!(key, cursor, evicted, "evicted records to fit ceiling");
        }
    }

    /// Change the ceiling, evicting immediately if it shrank below the current size.
    ///
    /// A ceiling of 0 drains the cache.
    pub fn resize(&self, max_bytes: usize) {
        let mut chains = self.chains.write();
        let previous = chains.max_size();
        chains.set_max_size(max_bytes);
        let evicted = chains.evict_to_fit();
        let size = chains.size();
        drop(chains);

        self.stats.record_resize();
        self.stats.record_evictions(evicted as u64);
        debug!(previous, max_bytes, evicted, size, "resized cache");
    }

    /// Approximate size in bytes (keys + values + per-record overhead)
    pub fn size(&self) -> usize {
        self.chains.read().size()
    }

    /// Current size ceiling in bytes
    pub fn max_size(&self) -> usize {
        self.chains.read().max_size()
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.chains.read().len()
    }

    /// Check if the cache holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of keys with at least one live record
    pub fn key_count(&self) -> usize {
        self.chains.read().key_count()
    }

    /// Check if `key` has any live record
    pub fn contains_key(&self, key: &str) -> bool {
        self.chains.read().contains_key(key)
    }

    /// Oldest cursor and value in the cache
    pub fn first(&self) -> Option<(u64, Bytes)> {
        self.chains.read().first().map(|(cursor, value)| (cursor, value.clone()))
    }

    /// Newest cursor and value in the cache
    pub fn last(&self) -> Option<(u64, Bytes)> {
        self.chains.read().last().map(|(cursor, value)| (cursor, value.clone()))
    }

    /// Iterate over the records of `key`, oldest first.
    ///
    /// The iterator holds a read lock until it is dropped, so writers block
    /// while it is alive.
    pub fn iter(&self, key: &str) -> Iter<'_> {
        let chains = self.chains.read();
        let next = chains.key_head(key);
        Iter {
            chains,
            next,
            after: None,
        }
    }

    /// Iterate over the records of `key` with a cursor greater than `cursor`,
    /// oldest first.
    ///
    /// The start is found by scanning backward from the newest record, so
    /// queries near the tail are cheap; worst case touches each record twice.
    /// Holds a read lock until dropped, like [`MvFifoCache::iter`].
    pub fn iter_after(&self, key: &str, cursor: u64) -> Iter<'_> {
        let chains = self.chains.read();
        let next = chains.seek_after(key, cursor);
        Iter {
            chains,
            next,
            after: Some(cursor),
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl Default for MvFifoCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MvFifoCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let chains = self.chains.read();
        f.debug_struct("MvFifoCache")
            .field("len", &chains.len())
            .field("size", &chains.size())
            .field("max_size", &chains.max_size())
            .field("keys", &chains.key_count())
            .finish()
    }
}

/// Lazy traversal of one key's records.
///
/// Created by [`MvFifoCache::iter`] and [`MvFifoCache::iter_after`]. Owns a
/// read guard on the cache; dropping the iterator releases it.
pub struct Iter<'a> {
    chains: RwLockReadGuard<'a, Chains>,
    next: Option<usize>,
    after: Option<u64>,
}

impl Iterator for Iter<'_> {
    type Item = (u64, Bytes);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let idx = self.next.take()?;
            let (cursor, value, next) = self.chains.entry(idx)?;
            let value = value.clone();
            self.next = next;
            if self.after.map_or(true, |after| cursor > after) {
                return Some((cursor, value));
            }
        }
    }
}

impl FusedIterator for Iter<'_> {}
