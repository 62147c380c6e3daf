//! Atomic publication of catalog snapshots.
//!
//! One writer (the refresher) replaces the whole catalog; any number of
//! request handlers read it. Readers take an `Arc<Catalog>` and keep it for
//! the whole lookup, so a request never straddles two generations.

use crate::catalog::Catalog;
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Holds the currently published [`Catalog`].
#[derive(Debug)]
pub struct CatalogStore {
    current: ArcSwap<Catalog>,
    generation: AtomicU64,
}

impl CatalogStore {
    /// Create a store holding the empty generation-0 catalog.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Catalog::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Current snapshot.
    pub fn load(&self) -> Arc<Catalog> {
        self.current.load_full()
    }

    /// Replace the published snapshot, returning its generation.
    pub fn publish(&self, mut catalog: Catalog) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        catalog.set_generation(generation);
        self.current.store(Arc::new(catalog));
        generation
    }

    /// Generation of the last publication (0 before the first one).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}
