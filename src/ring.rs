//! Consistent-hash ring for key ownership.
//!
//! Every member key (a peer identity, usually its URL) occupies
//! `replicas` positions on a 32-bit ring; a probe key is hashed once and
//! owned by the member holding the first position at or after the probe,
//! wrapping to the smallest position at the top of the ring. Virtual
//! nodes keep the key space evenly spread even with a handful of members,
//! and adding a member only reassigns the probes that land in its new
//! arcs.
//!
//! The ring is deterministic: two rings built with the same hash, the
//! same replica count and the same member set resolve every probe
//! identically, regardless of insertion order.
//!
//! The ring itself is not synchronized; the peer pool that shares one
//! across threads guards it with its own mutex.

use crate::bytes::ByteView;
use crate::config::RingConfig;
use core::fmt;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Hash function mapping bytes onto the ring's position space.
pub type RingHashFn = fn(&[u8]) -> u32;

/// The default ring hash (CRC-32/ISO-HDLC), wire-stable across nodes.
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// A replicated consistent-hash ring.
///
/// # Examples
///
/// ```
/// use peercache::{ByteView, HashRing, RingConfig};
///
/// let mut ring = HashRing::new(RingConfig::default());
/// ring.add(&ByteView::from_static(b"http://10.0.0.1:8080"));
/// ring.add(&ByteView::from_static(b"http://10.0.0.2:8080"));
///
/// let owner = ring.get(b"some/object").unwrap();
/// assert!(owner.as_slice().starts_with(b"http://10.0.0."));
/// ```
pub struct HashRing {
    replicas: usize,
    hash: RingHashFn,
    /// Every virtual-node position, sorted ascending.
    positions: Vec<u32>,
    /// Position to member key. Values are clones of the added key.
    owners: HashMap<u32, ByteView>,
    members: usize,
}

impl HashRing {
    /// Creates an empty ring from a configuration.
    pub fn new(config: RingConfig) -> Self {
        HashRing {
            replicas: config.replicas,
            hash: config.hash,
            positions: Vec::new(),
            owners: HashMap::new(),
            members: 0,
        }
    }

    /// Returns `true` if the ring has no members.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of member keys on the ring.
    pub fn members(&self) -> usize {
        self.members
    }

    /// Adds a member key, placing `replicas` virtual nodes.
    ///
    /// Returns `true` if the key was already present (detected by probing
    /// its first virtual position), in which case the ring is unchanged.
    pub fn add(&mut self, key: &ByteView) -> bool {
        let probe = (self.hash)(&virtual_key(0, key.as_slice()));
        if self.owners.contains_key(&probe) {
            return true;
        }

        for replica in 0..self.replicas {
            let position = (self.hash)(&virtual_key(replica, key.as_slice()));
            self.positions.push(position);
            self.owners.insert(position, key.clone());
        }
        self.positions.sort_unstable();
        self.members += 1;
        false
    }

    /// Returns the member owning `probe_key`, or `None` on an empty ring.
    pub fn get(&self, probe_key: &[u8]) -> Option<ByteView> {
        if self.positions.is_empty() {
            return None;
        }

        let h = (self.hash)(probe_key);
        // First position at or after the probe; wrap to the start when
        // the probe hashes past the last position.
        let idx = self.positions.partition_point(|&position| position < h);
        let idx = if idx == self.positions.len() { 0 } else { idx };
        self.owners.get(&self.positions[idx]).cloned()
    }

    /// Drops every member and virtual node.
    pub fn reset(&mut self) {
        self.positions.clear();
        self.owners.clear();
        self.members = 0;
    }
}

impl fmt::Debug for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("members", &self.members)
            .field("positions", &self.positions.len())
            .finish()
    }
}

/// Bytes hashed for one virtual node: the replica index in decimal ASCII
/// followed by the member key.
fn virtual_key(replica: usize, key: &[u8]) -> Vec<u8> {
    let mut buf = replica.to_string().into_bytes();
    buf.extend_from_slice(key);
    buf
}
