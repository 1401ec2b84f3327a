//! # lrucache
//!
//! Bounded, thread-safe key-value cache with LRU eviction.
//!
//! ## Architecture
//! - **Index**: AHash map from key to arena slot (O(1))
//! - **Recency List**: Doubly-linked list over a slot arena, with head and
//!   tail sentinels, ordered least to most recently used (O(1))
//! - **Synchronization**: One `parking_lot::RwLock` guarding both
//!
//! ```
//! use lrucache::LruCache;
//!
//! let cache = LruCache::new(2).unwrap();
//! cache.put("a", 1);
//! cache.put("b", 2);
//! cache.get(&"a");
//! cache.put("c", 3); // evicts "b"
//!
//! assert!(cache.contains_key(&"a"));
//! assert!(!cache.contains_key(&"b"));
//! ```

#![warn(missing_docs)]

mod cache;
mod error;
mod list;
mod lru;

pub use cache::LruCache;
pub use error::{Error, Result};
pub use list::Iter;
pub use lru::LruCore;
