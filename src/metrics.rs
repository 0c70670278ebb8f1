//! Group and cache statistics.
//!
//! All counters are monotonically increasing and incremented with relaxed
//! atomics: writers never take a lock for accounting, and readers may
//! observe any interleaving. A snapshot is a plain copy of the counters at
//! some instant and is not guaranteed to be consistent across counters.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-group counters maintained by the load orchestrator.
///
/// Obtain a reference via [`Group::stats`](crate::Group::stats) and read
/// individual counters with `Ordering::Relaxed` loads, or take a
/// [`snapshot`](GroupStats::snapshot).
#[derive(Debug, Default)]
pub struct GroupStats {
    /// Any `get` request.
    pub gets: AtomicU64,
    /// Requests served from the main or hot cache.
    pub cache_hits: AtomicU64,
    /// Total loads started (`gets` minus `cache_hits`).
    pub loads: AtomicU64,
    /// Loads that survived single-flight deduplication.
    pub loads_deduped: AtomicU64,
    /// Values fetched from the owning peer.
    pub peer_loads: AtomicU64,
    /// Failed peer fetches (recovered by a local load).
    pub peer_errors: AtomicU64,
    /// Values loaded from the local getter.
    pub local_loads: AtomicU64,
    /// Local getter failures surfaced to callers.
    pub local_load_errs: AtomicU64,
}

impl GroupStats {
    /// Copies every counter at some instant.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            gets: self.gets.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            loads_deduped: self.loads_deduped.load(Ordering::Relaxed),
            peer_loads: self.peer_loads.load(Ordering::Relaxed),
            peer_errors: self.peer_errors.load(Ordering::Relaxed),
            local_loads: self.local_loads.load(Ordering::Relaxed),
            local_load_errs: self.local_load_errs.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`GroupStats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Any `get` request.
    pub gets: u64,
    /// Requests served from the main or hot cache.
    pub cache_hits: u64,
    /// Total loads started.
    pub loads: u64,
    /// Loads that survived single-flight deduplication.
    pub loads_deduped: u64,
    /// Values fetched from the owning peer.
    pub peer_loads: u64,
    /// Failed peer fetches.
    pub peer_errors: u64,
    /// Values loaded from the local getter.
    pub local_loads: u64,
    /// Local getter failures.
    pub local_load_errs: u64,
}

/// A point-in-time copy of one synchronized cache's counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Sum of key and value lengths over live entries.
    pub bytes: u64,
    /// Number of live entries.
    pub items: u64,
    /// Lookups against this cache.
    pub gets: u64,
    /// Lookups that found a value.
    pub hits: u64,
    /// Entries evicted since creation.
    pub evictions: u64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bytes={} items={} gets={} hits={} evictions={}",
            self.bytes, self.items, self.gets, self.hits, self.evictions
        )
    }
}
