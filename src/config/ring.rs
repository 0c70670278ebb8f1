//! Configuration for the consistent-hash ring.

use crate::ring::{crc32, RingHashFn};
use core::fmt;

/// Virtual nodes placed per member when none is configured.
pub const DEFAULT_REPLICAS: usize = 50;

/// Configuration for a [`HashRing`](crate::HashRing).
///
/// Every node in a peer group must use the same `replicas` and `hash`,
/// otherwise they disagree about key ownership.
///
/// # Examples
///
/// ```
/// use peercache::RingConfig;
///
/// let config = RingConfig::default();
/// assert_eq!(config.replicas, 50);
/// ```
#[derive(Clone, Copy)]
pub struct RingConfig {
    /// Virtual-node multiplier: how many positions each member occupies.
    pub replicas: usize,
    /// Hash mapping bytes onto the 32-bit position space.
    pub hash: RingHashFn,
}

impl Default for RingConfig {
    /// 50 replicas with the CRC-32 position hash.
    fn default() -> Self {
        RingConfig {
            replicas: DEFAULT_REPLICAS,
            hash: crc32,
        }
    }
}

impl fmt::Debug for RingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingConfig")
            .field("replicas", &self.replicas)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RingConfig::default();
        assert_eq!(config.replicas, DEFAULT_REPLICAS);
        assert_eq!((config.hash)(b"hello"), crc32(b"hello"));
    }
}
