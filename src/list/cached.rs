//! Cache-Backed Section List
//!
//! Bounded LRU decorator over any section list, for the large lazily-paged
//! sections that absorb query traffic after load.
//!
//! ## Concurrency
//!
//! The cache lock is held only to probe and to insert, never across decode
//! I/O. Concurrent misses on the same key therefore race harmlessly: each
//! caller decodes independently, the last insert wins, and the counters
//! stay consistent (`requests == hits + misses`). There is no single-flight
//! coalescing of duplicate fetches.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::entity::Entity;
use crate::error::Result;
use crate::list::{EntityRange, SectionList};

/// LRU-cached decorator over a section list
pub struct CachedList<T: Entity> {
    inner: Box<dyn SectionList<T>>,
    cache: Mutex<LruCache<u32, Arc<T>>>,
    requests: AtomicU64,
    misses: AtomicU64,
}

impl<T: Entity> CachedList<T> {
    /// Wrap `inner` with a cache of `capacity` entries (clamped to >= 1)
    pub fn new(inner: Box<dyn SectionList<T>>, capacity: usize) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache::new(clamp_capacity(capacity))),
            requests: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Total lookups served since construction or the last `reset`
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Lookups that missed the cache and decoded from the source
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Miss ratio in `[0.0, 1.0]`; 0.0 before any request
    pub fn percentage_misses(&self) -> f64 {
        let requests = self.requests();
        if requests == 0 {
            0.0
        } else {
            self.misses() as f64 / requests as f64
        }
    }

    /// Current cache capacity (entries)
    pub fn cache_size(&self) -> usize {
        self.cache.lock().cap().get()
    }

    /// Resize the cache.
    ///
    /// Shrinking below current occupancy never fails; excess entries are
    /// evicted least-recently-used first. A capacity of 0 is clamped to 1.
    pub fn set_cache_size(&self, capacity: usize) {
        tracing::trace!(capacity, "resizing section cache");
        self.cache.lock().resize(clamp_capacity(capacity));
    }

    /// Number of entries currently cached
    pub fn occupancy(&self) -> usize {
        self.cache.lock().len()
    }

    /// Clear cached contents and zero the counters
    pub fn reset(&self) {
        tracing::trace!("resetting section cache");
        self.cache.lock().clear();
        self.requests.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl<T: Entity> SectionList<T> for CachedList<T> {
    fn count(&self) -> u32 {
        self.inner.count()
    }

    fn get(&self, index: u32) -> Result<Arc<T>> {
        self.requests.fetch_add(1, Ordering::Relaxed);

        if let Some(entity) = self.cache.lock().get(&index) {
            return Ok(Arc::clone(entity));
        }

        // Miss: decode outside the lock, then insert. A concurrent miss on
        // the same key decodes too; last write wins.
        self.misses.fetch_add(1, Ordering::Relaxed);
        let entity = self.inner.get(index)?;
        self.cache.lock().put(index, Arc::clone(&entity));
        Ok(entity)
    }

    /// Sequential scans bypass the cache and stream from the wrapped list
    fn range(&self, index: u32, count: u32) -> Result<EntityRange<'_, T>> {
        self.inner.range(index, count)
    }
}

fn clamp_capacity(capacity: usize) -> NonZeroUsize {
    NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN)
}
