//! Configuration for the load orchestrator.

/// Configuration for a [`Group`](crate::Group).
///
/// # Examples
///
/// ```
/// use peercache::GroupConfig;
///
/// // 64 MiB budget shared by the main and hot caches.
/// let config = GroupConfig::new("thumbnails", 64 << 20);
/// assert_eq!(config.name, "thumbnails");
/// ```
#[derive(Debug, Clone)]
pub struct GroupConfig {
    /// Group identifier; also the path segment peers use on the wire.
    pub name: String,
    /// Combined byte budget for the main and hot caches. `0` disables
    /// caching entirely: no lookups, no inserts, every `get` loads.
    pub cache_bytes: u64,
    /// Seed for the hot-cache promotion RNG. `None` seeds from entropy;
    /// tests pin it for deterministic promotion sequences.
    pub rng_seed: Option<u64>,
}

impl GroupConfig {
    /// Creates a config with an entropy-seeded RNG.
    pub fn new(name: impl Into<String>, cache_bytes: u64) -> Self {
        GroupConfig {
            name: name.into(),
            cache_bytes,
            rng_seed: None,
        }
    }

    /// Pins the promotion RNG seed.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = GroupConfig::new("g", 1024).with_rng_seed(7);
        assert_eq!(config.name, "g");
        assert_eq!(config.cache_bytes, 1024);
        assert_eq!(config.rng_seed, Some(7));
    }
}
