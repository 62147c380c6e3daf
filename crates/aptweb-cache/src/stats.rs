//! Cache statistics

#![allow(clippy::cast_precision_loss)] // Hit ratio intentionally accepts precision loss

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters updated on every cache operation
#[derive(Debug, Default)]
pub(crate) struct AtomicCacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl AtomicCacheStats {
    #[inline]
    pub(crate) fn record_get(&self, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_expirations(&self, count: usize) {
        self.expirations.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, entry_count: usize) -> CacheStats {
        CacheStats {
            hit_count: self.hits.load(Ordering::Relaxed),
            miss_count: self.misses.load(Ordering::Relaxed),
            insert_count: self.inserts.load(Ordering::Relaxed),
            eviction_count: self.evictions.load(Ordering::Relaxed),
            expiration_count: self.expirations.load(Ordering::Relaxed),
            entry_count,
        }
    }
}

/// Point-in-time view of cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that returned a live entry
    pub hit_count: u64,
    /// Lookups that found nothing or an expired entry
    pub miss_count: u64,
    /// Successful inserts
    pub insert_count: u64,
    /// Entries dropped to make room for new ones
    pub eviction_count: u64,
    /// Entries dropped because their TTL elapsed
    pub expiration_count: u64,
    /// Entries currently stored (may include not yet swept expired entries)
    pub entry_count: usize,
}

impl CacheStats {
    /// Fraction of lookups served from the cache, 0.0 when nothing was looked up
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}
