//! LRU (Least Recently Used) index + recency list
//!
//! `LruCore` is the unsynchronized structure: a hash index from key to
//! arena slot, plus the recency list. Every operation is O(1). Wrap it in a
//! lock (see [`LruCache`](crate::LruCache)) to share it between threads.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use ahash::RandomState;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::list::{Iter, RecencyList};

/// Upper bound on slots reserved up front; larger caches grow on demand
const PREALLOC_LIMIT: usize = 1024;

/// LRU cache with fixed capacity and no internal locking
pub struct LruCore<K, V> {
    map: HashMap<K, usize, RandomState>,
    list: RecencyList<K, V>,
    capacity: usize,
}

impl<K, V> LruCore<K, V> {
    /// Get the current number of entries
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<K, V> LruCore<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new LRU cache with the given capacity
    ///
    /// # Errors
    /// * `Error::InvalidConfiguration` if `capacity` is 0
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidConfiguration(
                "capacity must be greater than 0".to_string(),
            ));
        }

        debug!(capacity, "creating LRU cache");

        let reserved = capacity.min(PREALLOC_LIMIT);

        Ok(Self {
            map: HashMap::with_capacity_and_hasher(reserved, RandomState::new()),
            list: RecencyList::with_capacity(reserved),
            capacity,
        })
    }

    /// Get a value and mark it as most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.list.move_to_back(idx);
        self.list.entry(idx).map(|(_, v)| v)
    }

    /// Get a value without touching the recency order
    pub fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.list.entry(idx).map(|(_, v)| v)
    }

    /// Insert or overwrite a key-value pair, making it most recently used
    ///
    /// Returns the entry evicted to make room, if any. Overwriting an
    /// existing key never evicts.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.map.get(&key) {
            if let Some(slot) = self.list.value_mut(idx) {
                *slot = value;
            }
            self.list.move_to_back(idx);
            return None;
        }

        let evicted = if self.map.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        let idx = self.list.push_back(key.clone(), value);
        self.map.insert(key, idx);
        evicted
    }

    /// Remove a key, returning its value if it was present
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.map.remove(key)?;
        self.list.remove(idx).map(|(_, v)| v)
    }

    /// Check whether a key is present without touching the recency order
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Least recently used entry (the next eviction candidate)
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        self.list.front()
    }

    /// Most recently used entry
    pub fn peek_mru(&self) -> Option<(&K, &V)> {
        self.list.back()
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        debug!(entries = self.map.len(), "clearing LRU cache");
        self.map.clear();
        self.list.clear();
    }

    /// Iterate from least to most recently used
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.list.iter()
    }

    /// Verify that the index and the recency list describe the same set
    /// of entries and that the list links are sound.
    pub fn check_invariants(&self) -> Result<()> {
        self.list.check_links()?;

        if self.map.len() != self.list.len() {
            return Err(Error::Inconsistent(format!(
                "index has {} keys, list has {} entries",
                self.map.len(),
                self.list.len()
            )));
        }
        if self.map.len() > self.capacity {
            return Err(Error::Inconsistent(format!(
                "{} entries exceed capacity {}",
                self.map.len(),
                self.capacity
            )));
        }

        for (key, &idx) in &self.map {
            match self.list.entry(idx) {
                Some((list_key, _)) if list_key == key => {}
                Some(_) => {
                    return Err(Error::Inconsistent(format!(
                        "index points at slot {} holding a different key",
                        idx
                    )))
                }
                None => {
                    return Err(Error::Inconsistent(format!(
                        "index points at empty slot {}",
                        idx
                    )))
                }
            }
        }

        Ok(())
    }

    fn evict(&mut self) -> Option<(K, V)> {
        let (key, value) = self.list.pop_front()?;
        self.map.remove(&key);
        trace!(remaining = self.map.len(), "evicted least recently used entry");
        Some((key, value))
    }
}

impl<'a, K, V> IntoIterator for &'a LruCore<K, V>
where
    K: Hash + Eq + Clone,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> fmt::Display for LruCore<K, V>
where
    K: Hash + Eq + Clone + fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LruCache{{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        write!(f, "}}")
    }
}

impl<K, V> fmt::Debug for LruCore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCore")
            .field("len", &self.map.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
