//! Thread-safe LRU cache
//!
//! A single `RwLock` guards the index and the recency list together.
//! Operations that reorder entries, `get` included, take the write lock for
//! their whole duration; pure observers share the read lock.

use std::fmt;
use std::hash::Hash;

use parking_lot::RwLock;

use crate::error::Result;
use crate::lru::LruCore;

/// Bounded LRU cache that can be shared between threads
pub struct LruCache<K, V> {
    /// Index and recency list
    inner: RwLock<LruCore<K, V>>,

    /// Copy of the core's capacity so `capacity()` needs no lock.
    /// Taken from the core at construction; neither side ever changes it.
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a new cache with the given capacity
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries
    ///
    /// # Returns
    /// * `Result<LruCache>` - `Error::InvalidConfiguration` if `capacity` is 0
    pub fn new(capacity: usize) -> Result<Self> {
        let core = LruCore::new(capacity)?;
        let capacity = core.capacity();

        Ok(Self {
            inner: RwLock::new(core),
            capacity,
        })
    }

    /// Get a copy of a value and mark it as most recently used
    ///
    /// Lookup and promotion happen under one write lock, so a concurrent
    /// `remove` can never slip in between them.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut cache = self.inner.write();
        cache.get(key).cloned()
    }

    /// Get a copy of a value without changing the recency order
    pub fn peek(&self, key: &K) -> Option<V> {
        self.inner.read().peek(key).cloned()
    }

    /// Insert or overwrite a value, evicting the least recently used entry
    /// when the cache is full
    pub fn put(&self, key: K, value: V) {
        let mut cache = self.inner.write();
        cache.put(key, value);
    }

    /// Get a value, loading and caching it on a miss
    ///
    /// The loader runs without holding the lock. Two threads missing on the
    /// same key may both run it; the later insert wins.
    ///
    /// # Arguments
    /// * `key` - Key to look up
    /// * `load` - Produces the value on a miss (e.g. a read from a slower store)
    pub fn get_or_insert_with<F>(&self, key: K, load: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(&key) {
            return value;
        }

        let value = load();
        self.put(key, value.clone());
        value
    }

    /// Remove a key, returning its value if it was present
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut cache = self.inner.write();
        cache.remove(key)
    }

    /// Remove every entry
    pub fn clear(&self) {
        let mut cache = self.inner.write();
        cache.clear();
    }

    /// Check whether a key is present without changing the recency order
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.read().contains_key(key)
    }

    /// Get the current number of entries
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of all entries from least to most recently used
    pub fn entries(&self) -> Vec<(K, V)> {
        self.inner
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Verify that the index and the recency list agree
    pub fn check_invariants(&self) -> Result<()> {
        self.inner.read().check_invariants()
    }
}

impl<K, V> fmt::Display for LruCache<K, V>
where
    K: Hash + Eq + Clone + fmt::Display,
    V: fmt::Display,
{
    /// Renders `LruCache{k1=v1, k2=v2}` from least to most recently used.
    /// Diagnostic output only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.inner.read(), f)
    }
}

impl<K, V> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("len", &self.inner.read().len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
