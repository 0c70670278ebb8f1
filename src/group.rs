//! The load orchestrator.
//!
//! A [`Group`] is a named namespace of keys with its own loader, peer
//! picker, caches and statistics. `get` composes the other components
//! into the read-through pipeline:
//!
//! ```text
//!  get(key)
//!    │
//!    ├─▶ main cache ──hit──▶ return clone
//!    ├─▶ hot cache ───hit──▶ return clone
//!    │
//!    └─▶ single-flight run(key)
//!          │   (one task per key; late callers wait and share)
//!          ├─▶ re-check caches ──hit──▶ return
//!          ├─▶ pick_peer(key)
//!          │     ├─ Some(peer) ─▶ peer.get ──ok──▶ return (1/10: hot cache)
//!          │     │                   └─err─▶ log, count, fall through
//!          │     └─ None (self-owned)
//!          └─▶ local getter ──ok──▶ populate main cache ──▶ return
//! ```
//!
//! The main cache holds values this node authoritatively loaded; the hot
//! cache opportunistically holds a sample of values fetched from peers so
//! popular remote keys stop costing a round-trip. Both caches share one
//! byte budget: after every insert the orchestrator evicts oldest entries
//! (preferring the hot cache while it exceeds an eighth of the main
//! cache's footprint) until the combined size drops below the budget.
//!
//! All work runs on caller threads; no cache mutex is held across a peer
//! round-trip or a loader call.

use crate::bytes::ByteView;
use crate::cache::SyncCache;
use crate::config::GroupConfig;
use crate::error::{Error, Result};
use crate::metrics::{CacheStats, GroupStats};
use crate::peer::{Getter, PeerGetter, PeerPicker, PeerRequest};
use crate::singleflight::FlightGroup;
use core::fmt;
use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::Ordering;

/// One in `HOT_CACHE_ODDS` peer-loaded values is promoted into the hot
/// cache.
const HOT_CACHE_ODDS: u32 = 10;

/// Selects one of a group's two caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    /// Values this node loaded from its local getter.
    Main,
    /// Peer-loaded values promoted for popularity.
    Hot,
}

/// A read-through cache namespace over a local loader and a peer group.
///
/// A `Group` is safe to share across threads; every operation takes
/// `&self`.
///
/// # Examples
///
/// ```
/// use peercache::{ByteView, DynError, Group, GroupConfig, NoPeers};
///
/// let group = Group::new(
///     GroupConfig::new("greetings", 1 << 20),
///     Box::new(|key: &[u8]| -> Result<ByteView, DynError> {
///         let mut value = b"hello, ".to_vec();
///         value.extend_from_slice(key);
///         Ok(ByteView::from(value))
///     }),
///     Box::new(NoPeers),
/// );
///
/// let value = group.get("world").unwrap();
/// assert_eq!(value.as_slice(), b"hello, world");
///
/// // The second read is served from the main cache.
/// group.get("world").unwrap();
/// assert_eq!(group.stats().snapshot().cache_hits, 1);
/// ```
pub struct Group {
    name: String,
    getter: Box<dyn Getter>,
    peers: Box<dyn PeerPicker>,
    cache_bytes: u64,
    main_cache: SyncCache,
    hot_cache: SyncCache,
    loader: FlightGroup<Result<ByteView>>,
    rng: Mutex<SmallRng>,
    stats: GroupStats,
}

impl Group {
    /// Creates a group from its configuration, local loader and peer
    /// picker.
    pub fn new(config: GroupConfig, getter: Box<dyn Getter>, peers: Box<dyn PeerPicker>) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Group {
            name: config.name,
            getter,
            peers,
            cache_bytes: config.cache_bytes,
            main_cache: SyncCache::new(),
            hot_cache: SyncCache::new(),
            loader: FlightGroup::new(),
            rng: Mutex::new(rng),
            stats: GroupStats::default(),
        }
    }

    /// The group's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The group's monotonic counters.
    pub fn stats(&self) -> &GroupStats {
        &self.stats
    }

    /// Snapshot of one cache's counters.
    pub fn cache_stats(&self, kind: CacheKind) -> CacheStats {
        match kind {
            CacheKind::Main => self.main_cache.stats(),
            CacheKind::Hot => self.hot_cache.stats(),
        }
    }

    /// Returns the value for `key`, from cache, a peer, or the local
    /// loader.
    ///
    /// Concurrent calls for the same uncached key collapse into a single
    /// load whose result every caller receives. Peer failures are logged
    /// and recovered through the local loader; only local loader failures
    /// surface.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<ByteView> {
        let key = key.as_ref();
        self.stats.gets.fetch_add(1, Ordering::Relaxed);

        if let Some(value) = self.lookup_cache(key) {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }
        self.load(key)
    }

    /// Runs the uncached path under single-flight.
    fn load(&self, key: &[u8]) -> Result<ByteView> {
        self.stats.loads.fetch_add(1, Ordering::Relaxed);
        let key = ByteView::copy_from_slice(key);
        self.loader.run(&key, || self.do_load(&key))
    }

    /// The deduplicated load: at most one execution per key at a time.
    fn do_load(&self, key: &ByteView) -> Result<ByteView> {
        // A caller that lost the race to an earlier flight may find the
        // value already populated; skip the expensive path.
        if let Some(value) = self.lookup_cache(key.as_slice()) {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }
        self.stats.loads_deduped.fetch_add(1, Ordering::Relaxed);

        if let Some(peer) = self.peers.pick_peer(key.as_slice()) {
            match self.get_from_peer(peer.as_ref(), key) {
                Ok(value) => {
                    self.stats.peer_loads.fetch_add(1, Ordering::Relaxed);
                    return Ok(value);
                }
                Err(err) => {
                    log::warn!(
                        "group {}: peer {} failed for key {:?}: {}",
                        self.name,
                        peer.name(),
                        key,
                        err
                    );
                    self.stats.peer_errors.fetch_add(1, Ordering::Relaxed);
                    // Fall through to the local loader.
                }
            }
        }
        self.get_from_local(key)
    }

    /// Loads from the local getter and populates the main cache.
    fn get_from_local(&self, key: &ByteView) -> Result<ByteView> {
        match self.getter.get(key.as_slice()) {
            Ok(value) => {
                self.stats.local_loads.fetch_add(1, Ordering::Relaxed);
                self.populate(key, &value, CacheKind::Main);
                Ok(value)
            }
            Err(source) => {
                self.stats.local_load_errs.fetch_add(1, Ordering::Relaxed);
                Err(Error::loader(source))
            }
        }
    }

    /// Fetches from the owning peer, promoting a sample into the hot
    /// cache.
    fn get_from_peer(&self, peer: &dyn PeerGetter, key: &ByteView) -> Result<ByteView> {
        let request = PeerRequest {
            group: &self.name,
            key: key.as_slice(),
        };
        let response = peer.get(&request).map_err(Error::transport)?;
        let value = match response.value {
            Some(bytes) => ByteView::from(bytes),
            None => return Err(Error::MissingPeerValue),
        };

        let promote = self.rng.lock().gen_range(0..HOT_CACHE_ODDS) == 0;
        if promote {
            self.populate(key, &value, CacheKind::Hot);
        }
        Ok(value)
    }

    /// Consults main, then hot. Disabled caching never hits.
    fn lookup_cache(&self, key: &[u8]) -> Option<ByteView> {
        if self.cache_bytes == 0 {
            return None;
        }
        self.main_cache
            .get(key)
            .or_else(|| self.hot_cache.get(key))
    }

    /// Inserts into the chosen cache and evicts until the combined
    /// footprint is back under the byte budget.
    fn populate(&self, key: &ByteView, value: &ByteView, kind: CacheKind) {
        if self.cache_bytes == 0 {
            return;
        }
        match kind {
            CacheKind::Main => self.main_cache.add(key, value),
            CacheKind::Hot => self.hot_cache.add(key, value),
        }

        loop {
            let main_bytes = self.main_cache.bytes();
            let hot_bytes = self.hot_cache.bytes();
            if main_bytes + hot_bytes < self.cache_bytes {
                return;
            }

            let victim = if hot_bytes > main_bytes / 8 {
                &self.hot_cache
            } else {
                &self.main_cache
            };
            victim.remove_oldest();
        }
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("cache_bytes", &self.cache_bytes)
            .field("main_cache", &self.main_cache)
            .field("hot_cache", &self.hot_cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peer::{DynError, NoPeers, PeerResponse};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    /// Loader that counts invocations and echoes the key.
    struct CountingLoader {
        calls: Arc<AtomicUsize>,
    }

    impl Getter for CountingLoader {
        fn get(&self, key: &[u8]) -> std::result::Result<ByteView, DynError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut value = b"loaded:".to_vec();
            value.extend_from_slice(key);
            Ok(ByteView::from(value))
        }
    }

    fn counting_group(cache_bytes: u64) -> (Group, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let group = Group::new(
            GroupConfig::new("test", cache_bytes).with_rng_seed(1),
            Box::new(CountingLoader {
                calls: Arc::clone(&calls),
            }),
            Box::new(NoPeers),
        );
        (group, calls)
    }

    #[test]
    fn test_get_caches_the_value() {
        let (group, calls) = counting_group(1 << 20);

        let first = group.get("k1").unwrap();
        let second = group.get("k1").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.as_slice(), b"loaded:k1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let snap = group.stats().snapshot();
        assert_eq!(snap.gets, 2);
        assert_eq!(snap.cache_hits, 1);
        assert_eq!(snap.local_loads, 1);
    }

    #[test]
    fn test_zero_budget_disables_caching() {
        let (group, calls) = counting_group(0);

        group.get("k").unwrap();
        group.get("k").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(group.stats().snapshot().cache_hits, 0);
        assert_eq!(group.cache_stats(CacheKind::Main).items, 0);
    }

    #[test]
    fn test_loader_error_surfaces_and_is_counted() {
        let group = Group::new(
            GroupConfig::new("test", 1 << 20),
            Box::new(|_key: &[u8]| -> std::result::Result<ByteView, DynError> {
                Err("backend down".into())
            }),
            Box::new(NoPeers),
        );

        let err = group.get("k").unwrap_err();
        assert!(matches!(err, Error::Loader(_)));
        assert_eq!(group.stats().snapshot().local_load_errs, 1);

        // Errors are not cached; the next get loads again.
        assert!(group.get("k").is_err());
        assert_eq!(group.stats().snapshot().local_load_errs, 2);
    }

    /// Picker whose peer always answers with a fixed response.
    struct FixedPeer {
        response: fn() -> std::result::Result<PeerResponse, DynError>,
    }

    impl PeerGetter for FixedPeer {
        fn name(&self) -> &str {
            "http://127.0.0.1:9"
        }

        fn get(
            &self,
            _request: &PeerRequest<'_>,
        ) -> std::result::Result<PeerResponse, DynError> {
            (self.response)()
        }
    }

    struct FixedPicker {
        peer: Arc<FixedPeer>,
    }

    impl PeerPicker for FixedPicker {
        fn pick_peer(&self, _key: &[u8]) -> Option<Arc<dyn PeerGetter>> {
            Some(Arc::clone(&self.peer) as Arc<dyn PeerGetter>)
        }
    }

    fn peer_group(
        response: fn() -> std::result::Result<PeerResponse, DynError>,
        loader_calls: Arc<AtomicUsize>,
    ) -> Group {
        Group::new(
            GroupConfig::new("test", 1 << 20).with_rng_seed(1),
            Box::new(CountingLoader {
                calls: loader_calls,
            }),
            Box::new(FixedPicker {
                peer: Arc::new(FixedPeer { response }),
            }),
        )
    }

    #[test]
    fn test_missing_peer_value_falls_back_to_local() {
        let calls = Arc::new(AtomicUsize::new(0));
        let group = peer_group(|| Ok(PeerResponse::default()), Arc::clone(&calls));

        let value = group.get("k").unwrap();
        assert_eq!(value.as_slice(), b"loaded:k");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let snap = group.stats().snapshot();
        assert_eq!(snap.peer_errors, 1);
        assert_eq!(snap.peer_loads, 0);
        assert_eq!(snap.local_loads, 1);
    }

    #[test]
    fn test_peer_transport_error_falls_back_to_local() {
        let calls = Arc::new(AtomicUsize::new(0));
        let group = peer_group(|| Err("connection refused".into()), Arc::clone(&calls));

        let value = group.get("k").unwrap();
        assert_eq!(value.as_slice(), b"loaded:k");
        assert_eq!(group.stats().snapshot().peer_errors, 1);
    }

    #[test]
    fn test_peer_success_skips_local_loader() {
        let calls = Arc::new(AtomicUsize::new(0));
        let group = peer_group(
            || {
                Ok(PeerResponse {
                    value: Some(b"from-peer".to_vec()),
                    minute_qps: 0.0,
                })
            },
            Arc::clone(&calls),
        );

        let value = group.get("k").unwrap();
        assert_eq!(value.as_slice(), b"from-peer");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(group.stats().snapshot().peer_loads, 1);
    }

    #[test]
    fn test_budget_eviction_prefers_hot_over_an_eighth() {
        let (group, _calls) = counting_group(64);

        // Each entry is a 10-byte key plus a 17-byte value: 27 bytes.
        for key in ["aaaaaaaaaa", "bbbbbbbbbb", "cccccccccc", "dddddddddd"] {
            group.get(key).unwrap();
        }

        let main = group.cache_stats(CacheKind::Main);
        let hot = group.cache_stats(CacheKind::Hot);
        assert!(main.bytes + hot.bytes < 64, "main={} hot={}", main, hot);
        assert!(main.evictions >= 2);
    }

    #[test]
    fn test_entry_larger_than_budget_evicts_itself() {
        let (group, _calls) = counting_group(16);

        // "loaded:" + key comfortably exceeds the 16-byte budget.
        let value = group.get("oversized-key-000").unwrap();
        assert_eq!(value.as_slice(), b"loaded:oversized-key-000");

        let main = group.cache_stats(CacheKind::Main);
        assert_eq!(main.items, 0);
        assert!(main.evictions >= 1);
    }

    #[test]
    fn test_group_identity() {
        let (group, _calls) = counting_group(1024);
        assert_eq!(group.name(), "test");
    }
}
