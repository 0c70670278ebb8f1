#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Read path
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        Group::get(key)                           │
//! │                                                                  │
//! │  main cache ─▶ hot cache ─▶ single-flight ─▶ peer ─▶ local load  │
//! │      │             │              │            │         │       │
//! │     hit           hit        dedup+share    owner ≠    owner =   │
//! │                                             self       self     │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Component map
//!
//! | Type | Role |
//! |------|------|
//! | [`ByteView`] | Shared immutable bytes; keys, values and peer names |
//! | [`LruCache`] | Ordered map with entry cap and evict hook |
//! | [`HashRing`] | Key → owning peer, virtual-node consistent hashing |
//! | [`PeerPool`] | Ring-backed [`PeerPicker`] over a transport's getters |
//! | [`FlightGroup`] | At-most-one concurrent load per key |
//! | [`Group`] | The read-through orchestrator |
//! | [`Getter`] / [`PeerPicker`] / [`PeerGetter`] | Collaborator seams |
//!
//! ## Choosing a byte budget
//!
//! The budget covers both caches of a group: the main cache (values this
//! node owns) and the hot cache (popular values owned by peers). The
//! orchestrator keeps `main + hot` strictly below the budget, preferring
//! to evict hot entries while the hot cache exceeds an eighth of the
//! main cache's footprint. A budget of `0` turns both caches off.
//!
//! ## Modules
//!
//! - [`bytes`]: shared immutable byte handles
//! - [`lru`]: the LRU map under both caches
//! - [`ring`]: consistent-hash key ownership
//! - [`pool`]: ring-backed peer picker
//! - [`singleflight`]: load deduplication
//! - [`group`]: the orchestrator
//! - [`peer`]: loader and peer contracts
//! - [`metrics`]: group and cache statistics
//! - [`config`]: construction options
//! - [`error`]: error kinds

/// Shared, immutable byte-string handles.
///
/// [`ByteView`] is either a static borrow or a reference-counted heap
/// buffer; cloning never copies contents.
pub mod bytes;

/// Construction options for groups and rings.
pub mod config;

/// Error kinds surfaced by the load pipeline.
pub mod error;

/// The load orchestrator: cache lookup, peer dispatch, local load and
/// population under a shared byte budget.
pub mod group;

/// Doubly linked recency list backing the LRU map.
///
/// Internal infrastructure with raw-pointer surgery; use [`LruCache`]
/// instead.
pub(crate) mod list;

/// Least Recently Used map with an eviction callback.
pub mod lru;

/// Monotonic statistics for groups and their caches.
pub mod metrics;

/// Local-loader and peer contracts plus the wire envelopes.
pub mod peer;

/// Ring-backed peer picker with wholesale membership replacement.
pub mod pool;

/// Consistent-hash ring mapping keys to owning peers.
pub mod ring;

/// Single-flight deduplication of concurrent loads.
pub mod singleflight;

/// Mutex-synchronized byte cache used for the main and hot tiers.
mod cache;

pub use bytes::ByteView;
pub use config::{GroupConfig, RingConfig};
pub use error::{Error, Result};
pub use group::{CacheKind, Group};
pub use lru::LruCache;
pub use metrics::{CacheStats, GroupStats, StatsSnapshot};
pub use peer::{
    DynError, Getter, NoPeers, PeerGetter, PeerPicker, PeerRequest, PeerResponse,
    DEFAULT_BASE_PATH,
};
pub use pool::{PeerGetterFactory, PeerPool};
pub use ring::HashRing;
pub use singleflight::FlightGroup;
