//! In-memory TTL cache with a hard entry limit
//!
//! Storage is a `DashMap` so concurrent request handlers contend only on
//! shards. Entries carry an absolute expiry and an insertion sequence number;
//! when the cache is full, expired entries are dropped first, then the oldest
//! insertion.

use crate::{
    config::TtlCacheConfig,
    error::{CacheError, CacheResult},
    stats::{AtomicCacheStats, CacheStats},
};
use dashmap::DashMap;
use std::{
    hash::Hash,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    seq: u64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Bounded-capacity cache whose entries expire after a fixed TTL.
pub struct TtlCache<K, V>
where
    K: Eq + Hash,
{
    storage: Arc<DashMap<K, CacheEntry<V>>>,
    config: TtlCacheConfig,
    next_seq: AtomicU64,
    stats: Arc<AtomicCacheStats>,
    cleanup_handle: Option<tokio::task::JoinHandle<()>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a new cache. No background task is started.
    pub fn new(config: TtlCacheConfig) -> CacheResult<Self> {
        config
            .validate()
            .map_err(CacheError::InvalidConfiguration)?;

        Ok(Self {
            storage: Arc::new(DashMap::with_capacity(config.max_entries.min(1024))),
            config,
            next_seq: AtomicU64::new(0),
            stats: Arc::new(AtomicCacheStats::default()),
            cleanup_handle: None,
        })
    }

    /// Create a new cache and start the background sweeper.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new_with_cleanup(config: TtlCacheConfig) -> CacheResult<Self> {
        let cleanup_interval = config.cleanup_interval;
        let mut cache = Self::new(config)?;

        if cleanup_interval > Duration::ZERO {
            cache.start_cleanup_task(cleanup_interval);
        }

        Ok(cache)
    }

    fn start_cleanup_task(&mut self, cleanup_interval: Duration) {
        let storage = Arc::clone(&self.storage);
        let stats = Arc::clone(&self.stats);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(cleanup_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let removed = purge(&storage, Instant::now());
                if removed > 0 {
                    stats.record_expirations(removed);
                    tracing::debug!(removed, "swept expired cache entries");
                }
            }
        });

        self.cleanup_handle = Some(handle);
    }

    /// Look up a live entry.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();

        if let Some(entry) = self.storage.get(key) {
            if !entry.is_expired(now) {
                let value = entry.value.clone();
                self.stats.record_get(true);
                return Some(value);
            }

            // Release the shard guard before removing
            drop(entry);
            if self
                .storage
                .remove_if(key, |_, entry| entry.is_expired(now))
                .is_some()
            {
                self.stats.record_expirations(1);
            }
        }

        self.stats.record_get(false);
        None
    }

    /// Insert a value with the configured TTL.
    pub fn insert(&self, key: K, value: V) {
        self.insert_with_ttl(key, value, self.config.ttl);
    }

    /// Insert a value with an explicit TTL.
    pub fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        if !self.storage.contains_key(&key) {
            self.make_room();
        }

        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
        };
        self.storage.insert(key, entry);
        self.stats.record_insert();
    }

    /// Remove an entry, returning whether one was present.
    pub fn remove(&self, key: &K) -> bool {
        self.storage.remove(key).is_some()
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.storage.clear();
    }

    /// Drop expired entries now, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let removed = purge(&self.storage, Instant::now());
        self.stats.record_expirations(removed);
        removed
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.storage.len())
    }

    /// Configuration in use.
    pub fn config(&self) -> &TtlCacheConfig {
        &self.config
    }

    fn make_room(&self) {
        if self.storage.len() < self.config.max_entries {
            return;
        }

        self.purge_expired();

        while self.storage.len() >= self.config.max_entries {
            let oldest = self
                .storage
                .iter()
                .min_by_key(|entry| entry.value().seq)
                .map(|entry| entry.key().clone());

            match oldest {
                Some(key) => {
                    if self.storage.remove(&key).is_some() {
                        self.stats.record_eviction();
                    }
                }
                None => break,
            }
        }
    }
}

fn purge<K, V>(storage: &DashMap<K, CacheEntry<V>>, now: Instant) -> usize
where
    K: Eq + Hash,
{
    let before = storage.len();
    storage.retain(|_, entry| !entry.is_expired(now));
    before.saturating_sub(storage.len())
}

impl<K, V> Drop for TtlCache<K, V>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        if let Some(handle) = self.cleanup_handle.take() {
            handle.abort();
        }
    }
}

impl<K, V> std::fmt::Debug for TtlCache<K, V>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.storage.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
