//! Least Recently Used (LRU) map.
//!
//! The ordered map under both node-local caches. A hash index provides
//! O(1) lookup and a doubly linked recency list provides O(1) promotion
//! and eviction.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                         LruCache                               │
//! │                                                                │
//! │  HashMap<K, *Node>          Recency list                       │
//! │  ┌──────────────┐          ┌────────────────────────────┐      │
//! │  │ "apple" ──────────────▶ │ MRU ◀──▶ ... ◀──▶ LRU      │      │
//! │  │ "banana" ─────────────▶ │  ▲                  │      │      │
//! │  │ "cherry" ─────────────▶ │  │                  ▼      │      │
//! │  └──────────────┘          │ head             tail      │      │
//! │                            └────────────────────────────┘      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every live entry is reachable from both the index and the list, and
//! the two always have the same length.
//!
//! # Eviction
//!
//! With `max_entries > 0` the map evicts the least recently used entry
//! when an insert pushes it over the cap. `max_entries == 0` means
//! unbounded; the synchronized caches run unbounded and let the load
//! orchestrator enforce a byte budget across both of them instead.
//!
//! An optional evict handler observes `(key, value)` of every entry that
//! leaves the map through eviction, [`remove`](LruCache::remove),
//! [`remove_oldest`](LruCache::remove_oldest), [`clear`](LruCache::clear)
//! or drop. The handler runs exactly once per removed entry, before the
//! entry's storage is reused. Replacing a value via
//! [`add`](LruCache::add) does not run the handler; the previous value is
//! handed back to the caller instead.
//!
//! # Thread Safety
//!
//! `LruCache` is not internally synchronized. The synchronized cache
//! wraps it in a mutex; standalone users should do the same.

use crate::list::{List, Node};
use core::borrow::Borrow;
use core::fmt;
use core::hash::Hash;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Callback observing each entry as it leaves the map.
///
/// Runs inline on the mutating thread, so it must be fast and must not
/// re-enter the cache it is registered on.
pub type EvictHandler<K, V> = Box<dyn FnMut(&K, &V) + Send>;

/// A `(key, value)` pair as stored in the recency list.
struct Entry<K, V> {
    key: K,
    value: V,
}

/// An LRU map with O(1) operations and an eviction callback.
///
/// # Examples
///
/// ```
/// use peercache::LruCache;
///
/// let mut cache = LruCache::new(2);
/// cache.add("a", 1);
/// cache.add("b", 2);
/// cache.get(&"a");     // "a" becomes most recently used
/// cache.add("c", 3);   // "b" evicted (least recently used)
///
/// assert_eq!(cache.get(&"b"), None);
/// assert_eq!(cache.get(&"a"), Some(&1));
/// assert_eq!(cache.get(&"c"), Some(&3));
/// ```
pub struct LruCache<K, V> {
    /// Entry cap; 0 means unbounded.
    max_entries: usize,
    list: List<Entry<K, V>>,
    map: HashMap<K, *mut Node<Entry<K, V>>>,
    on_evicted: Option<EvictHandler<K, V>>,
}

// SAFETY: LruCache owns all data; the raw pointers in `map` point only to
// nodes owned by `list`. Concurrent use requires external synchronization,
// which the Send/Sync bounds on K and V preserve.
unsafe impl<K: Send, V: Send> Send for LruCache<K, V> {}

// SAFETY: all mutation requires &mut self; shared references only read.
unsafe impl<K: Send, V: Send> Sync for LruCache<K, V> {}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    /// Creates an LRU map holding at most `max_entries` entries, or
    /// unbounded when `max_entries` is 0.
    pub fn new(max_entries: usize) -> Self {
        LruCache {
            max_entries,
            list: List::new(),
            map: HashMap::new(),
            on_evicted: None,
        }
    }

    /// Creates an LRU map that reports removed entries to `on_evicted`.
    pub fn with_evict_handler(max_entries: usize, on_evicted: EvictHandler<K, V>) -> Self {
        LruCache {
            max_entries,
            list: List::new(),
            map: HashMap::new(),
            on_evicted: Some(on_evicted),
        }
    }

    /// Returns the number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the map holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Inserts a key-value pair at the most-recently-used position.
    ///
    /// If the key is already present its value is replaced, the entry is
    /// promoted, and the previous value is returned; the evict handler
    /// does not run for a replacement. If the insert pushes the map over
    /// `max_entries`, the least recently used entry is evicted through
    /// the handler.
    pub fn add(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&node) = self.map.get(&key) {
            unsafe {
                // SAFETY: node comes from our map and is owned by `list`
                self.list.move_to_front(node);
                let entry = (*node).value_mut();
                return Some(core::mem::replace(&mut entry.value, value));
            }
        }

        let node = self.list.push_front(Entry {
            key: key.clone(),
            value,
        });
        self.map.insert(key, node);

        if self.max_entries > 0 && self.map.len() > self.max_entries {
            self.remove_oldest();
        }
        None
    }

    /// Returns the value for `key` and promotes the entry to the
    /// most-recently-used position.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if let Some(&node) = self.map.get(key) {
            unsafe {
                // SAFETY: node comes from our map and is owned by `list`
                self.list.move_to_front(node);
                Some(&(*node).value().value)
            }
        } else {
            None
        }
    }

    /// Removes `key` from the map, running the evict handler with the
    /// entry before returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let node = self.map.remove(key)?;
        // SAFETY: node comes from our map and is owned by `list`
        let boxed = unsafe { self.list.remove(node) };
        // SAFETY: real node, value initialized
        let entry = unsafe { boxed.into_value() };
        if let Some(hook) = self.on_evicted.as_mut() {
            hook(&entry.key, &entry.value);
        }
        Some(entry.value)
    }

    /// Evicts the least recently used entry, running the evict handler,
    /// and returns the removed pair.
    pub fn remove_oldest(&mut self) -> Option<(K, V)> {
        let boxed = self.list.pop_back()?;
        // SAFETY: pop_back only returns real nodes
        let entry = unsafe { boxed.into_value() };
        self.map.remove(&entry.key);
        if let Some(hook) = self.on_evicted.as_mut() {
            hook(&entry.key, &entry.value);
        }
        Some((entry.key, entry.value))
    }

    /// Iterates entries from most to least recently used.
    ///
    /// The borrow of `self` keeps the map stable for the walk; callers
    /// sharing the map across threads must hold their lock for the whole
    /// iteration.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.list.iter().map(|entry| (&entry.key, &entry.value))
    }

    /// Removes every entry, running the evict handler for each.
    pub fn clear(&mut self) {
        while self.remove_oldest().is_some() {}
    }
}

impl<K, V> Drop for LruCache<K, V> {
    /// Teardown counts as removal: the evict handler observes every
    /// remaining entry.
    fn drop(&mut self) {
        if let Some(hook) = self.on_evicted.as_mut() {
            while let Some(boxed) = self.list.pop_back() {
                // SAFETY: pop_back only returns real nodes
                let entry = unsafe { boxed.into_value() };
                hook(&entry.key, &entry.value);
            }
        }
        // Remaining nodes (no handler registered) drop with the list.
    }
}

impl<K, V> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("max_entries", &self.max_entries)
            .field("len", &self.map.len())
            .finish()
    }
}
