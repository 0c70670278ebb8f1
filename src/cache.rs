//! Mutex-synchronized byte cache.
//!
//! [`SyncCache`] wraps an unbounded [`LruCache`] keyed and valued by
//! [`ByteView`] and keeps byte/hit/eviction counters alongside it. The
//! load orchestrator owns two of these (main and hot) and drives eviction
//! against their combined size, so the inner LRU carries no entry cap of
//! its own.
//!
//! Counters are relaxed atomics mutated only while the cache mutex is
//! held; readers take no lock. The eviction accounting lives in the LRU's
//! evict handler, so any path that removes an entry (budget eviction
//! today, explicit removal if it grows one) stays balanced.

use crate::bytes::ByteView;
use crate::lru::LruCache;
use crate::metrics::CacheStats;
use core::fmt;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Counters {
    /// Sum of key + value lengths of live entries.
    nbytes: AtomicU64,
    nget: AtomicU64,
    nhit: AtomicU64,
    nevict: AtomicU64,
}

/// A thread-safe LRU byte cache with byte accounting.
pub(crate) struct SyncCache {
    lru: Mutex<LruCache<ByteView, ByteView>>,
    counters: Arc<Counters>,
}

impl SyncCache {
    /// Creates an empty cache whose evict handler folds removed entries
    /// out of the byte count.
    pub(crate) fn new() -> Self {
        let counters = Arc::new(Counters::default());
        let on_evicted = Arc::clone(&counters);
        let lru = LruCache::with_evict_handler(
            0,
            Box::new(move |key: &ByteView, value: &ByteView| {
                on_evicted
                    .nbytes
                    .fetch_sub((key.len() + value.len()) as u64, Ordering::Relaxed);
                on_evicted.nevict.fetch_add(1, Ordering::Relaxed);
            }),
        );
        SyncCache {
            lru: Mutex::new(lru),
            counters,
        }
    }

    /// Stores a key-value pair, cloning both handles.
    ///
    /// Byte accounting: `+key+value` for the stored entry, minus the
    /// previous value's length when an existing entry is replaced (the
    /// key stays resident).
    pub(crate) fn add(&self, key: &ByteView, value: &ByteView) {
        let mut lru = self.lru.lock();
        let replaced = lru.add(key.clone(), value.clone());
        self.counters
            .nbytes
            .fetch_add((key.len() + value.len()) as u64, Ordering::Relaxed);
        if let Some(old) = replaced {
            self.counters
                .nbytes
                .fetch_sub((key.len() + old.len()) as u64, Ordering::Relaxed);
        }
    }

    /// Looks up `key`, promoting and cloning the value on a hit.
    pub(crate) fn get(&self, key: &[u8]) -> Option<ByteView> {
        let mut lru = self.lru.lock();
        self.counters.nget.fetch_add(1, Ordering::Relaxed);
        let value = lru.get(key).cloned();
        if value.is_some() {
            self.counters.nhit.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    /// Evicts the least recently used entry. Returns `false` when the
    /// cache was already empty.
    pub(crate) fn remove_oldest(&self) -> bool {
        self.lru.lock().remove_oldest().is_some()
    }

    /// Current byte footprint (keys + values of live entries).
    #[inline]
    pub(crate) fn bytes(&self) -> u64 {
        self.counters.nbytes.load(Ordering::Relaxed)
    }

    /// Number of live entries.
    pub(crate) fn items(&self) -> u64 {
        self.lru.lock().len() as u64
    }

    /// Copies the counters at some instant.
    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            bytes: self.bytes(),
            items: self.items(),
            gets: self.counters.nget.load(Ordering::Relaxed),
            hits: self.counters.nhit.load(Ordering::Relaxed),
            evictions: self.counters.nevict.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for SyncCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncCache")
            .field("bytes", &self.bytes())
            .field("items", &self.lru.lock().len())
            .finish()
    }
}
