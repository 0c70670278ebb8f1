//! Ring-backed peer picker.
//!
//! [`PeerPool`] is the piece between a [`Group`](crate::Group) and a
//! transport: it owns the consistent-hash ring for one peer set, knows
//! this node's own identity, and answers
//! [`pick_peer`](crate::PeerPicker::pick_peer) by comparing the ring's
//! owner against itself. The transport only supplies a factory that turns
//! a peer identity into a [`PeerGetter`] (an HTTP client, a loopback stub
//! in tests).
//!
//! Membership changes are wholesale: [`set_peers`](PeerPool::set_peers)
//! rebuilds the ring and the getter table from the full peer list,
//! dropping getters for departed peers. The ring itself is not
//! synchronized; the pool guards it, together with the getter table,
//! behind one mutex.

use crate::bytes::ByteView;
use crate::config::RingConfig;
use crate::peer::{PeerGetter, PeerPicker};
use crate::ring::HashRing;
use core::fmt;
use parking_lot::Mutex;
use std::sync::Arc;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Builds a fetch handle for a peer identity.
///
/// Called once per remote peer on every [`PeerPool::set_peers`]; the
/// local identity never reaches the factory.
pub type PeerGetterFactory = Box<dyn Fn(&str) -> Arc<dyn PeerGetter> + Send + Sync>;

/// Ring state and the getters built for the current peer set.
struct PoolState {
    ring: HashRing,
    getters: HashMap<ByteView, Arc<dyn PeerGetter>>,
}

/// A [`PeerPicker`] that routes keys over a consistent-hash ring.
///
/// Every node in the group must construct its pool with the same
/// [`RingConfig`] and the same peer list, otherwise nodes disagree about
/// ownership and keys get loaded in several places.
pub struct PeerPool {
    self_id: ByteView,
    config: RingConfig,
    factory: PeerGetterFactory,
    state: Mutex<PoolState>,
}

impl PeerPool {
    /// Creates a pool for the node identified by `self_id` (URL form,
    /// e.g. `http://10.0.0.1:8080`) with an empty peer set.
    pub fn new(self_id: impl Into<String>, config: RingConfig, factory: PeerGetterFactory) -> Self {
        PeerPool {
            self_id: ByteView::from(self_id.into()),
            config,
            factory,
            state: Mutex::new(PoolState {
                ring: HashRing::new(config),
                getters: HashMap::new(),
            }),
        }
    }

    /// This node's identity as placed on the ring.
    pub fn self_id(&self) -> &ByteView {
        &self.self_id
    }

    /// Replaces the peer set wholesale.
    ///
    /// `peers` must include this node's own identity for the ring to
    /// route anything to it. Getters are rebuilt through the factory for
    /// every remote peer; handles for departed peers are dropped.
    pub fn set_peers<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ring = HashRing::new(self.config);
        let mut getters = HashMap::new();

        for peer in peers {
            let peer = peer.as_ref();
            let id = ByteView::copy_from_slice(peer.as_bytes());
            ring.add(&id);
            if id != self.self_id {
                getters.insert(id, (self.factory)(peer));
            }
        }

        let mut state = self.state.lock();
        state.ring = ring;
        state.getters = getters;
    }

    /// Number of peers currently on the ring, this node included.
    pub fn peer_count(&self) -> usize {
        self.state.lock().ring.members()
    }
}

impl PeerPicker for PeerPool {
    /// Resolves `key` on the ring. Returns `None` when the ring is empty
    /// or selects this node; a key owned by a remote peer yields that
    /// peer's getter.
    fn pick_peer(&self, key: &[u8]) -> Option<Arc<dyn PeerGetter>> {
        let state = self.state.lock();
        let owner = state.ring.get(key)?;
        if owner == self.self_id {
            return None;
        }
        state.getters.get(owner.as_slice()).cloned()
    }
}

impl fmt::Debug for PeerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerPool")
            .field("self_id", &self.self_id)
            .field("peers", &self.peer_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peer::{DynError, PeerRequest, PeerResponse};

    /// Stub getter that remembers which peer it stands for.
    struct StubPeer {
        id: String,
    }

    impl PeerGetter for StubPeer {
        fn name(&self) -> &str {
            &self.id
        }

        fn get(&self, _request: &PeerRequest<'_>) -> Result<PeerResponse, DynError> {
            Ok(PeerResponse {
                value: Some(self.id.clone().into_bytes()),
                minute_qps: 0.0,
            })
        }
    }

    /// Decimal positions as in the ring tests: member "2" with 3 replicas
    /// sits at 2, 12, 22.
    fn decimal_hash(data: &[u8]) -> u32 {
        std::str::from_utf8(data)
            .expect("test keys are ascii")
            .parse()
            .expect("test keys are decimal")
    }

    fn decimal_pool(self_id: &str) -> PeerPool {
        let pool = PeerPool::new(
            self_id,
            RingConfig {
                replicas: 3,
                hash: decimal_hash,
            },
            Box::new(|peer: &str| Arc::new(StubPeer { id: peer.to_string() }) as Arc<dyn PeerGetter>),
        );
        pool.set_peers(["2", "4", "6"]);
        pool
    }

    #[test]
    fn test_empty_pool_owns_everything() {
        let pool = PeerPool::new(
            "http://localhost:1",
            RingConfig::default(),
            Box::new(|peer: &str| Arc::new(StubPeer { id: peer.to_string() }) as Arc<dyn PeerGetter>),
        );
        assert_eq!(pool.peer_count(), 0);
        assert!(pool.pick_peer(b"anything").is_none());
    }

    #[test]
    fn test_self_owned_keys_return_none() {
        let pool = decimal_pool("2");
        // Positions 2, 12, 22 belong to "2": probes at or below them that
        // resolve to "2" stay local.
        assert!(pool.pick_peer(b"1").is_none());
        assert!(pool.pick_peer(b"11").is_none());
        // Wrap-around past 26 lands on position 2, also self.
        assert!(pool.pick_peer(b"27").is_none());
    }

    #[test]
    fn test_remote_keys_yield_the_owners_getter() {
        let pool = decimal_pool("2");
        let peer = pool.pick_peer(b"3").expect("3 is owned by peer 4");
        assert_eq!(peer.name(), "4");

        let peer = pool.pick_peer(b"25").expect("25 is owned by peer 6");
        assert_eq!(peer.name(), "6");
    }

    #[test]
    fn test_set_peers_is_wholesale() {
        let pool = decimal_pool("2");
        assert_eq!(pool.peer_count(), 3);

        // Drop "4": its keys move to the next position on the ring.
        pool.set_peers(["2", "6"]);
        assert_eq!(pool.peer_count(), 2);
        let peer = pool.pick_peer(b"3").expect("3 now belongs to peer 6");
        assert_eq!(peer.name(), "6");

        // An empty update empties the ring.
        pool.set_peers(Vec::<&str>::new());
        assert!(pool.pick_peer(b"3").is_none());
    }

    #[test]
    fn test_factory_runs_only_for_remote_peers() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let pool = PeerPool::new(
            "2",
            RingConfig {
                replicas: 3,
                hash: decimal_hash,
            },
            Box::new(move |peer: &str| {
                counter.fetch_add(1, Ordering::SeqCst);
                Arc::new(StubPeer { id: peer.to_string() }) as Arc<dyn PeerGetter>
            }),
        );

        pool.set_peers(["2", "4", "6"]);
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }
}
