//! Bounded in-memory cache of decoded thumbnails.
//!
//! Keyed by `(content identity, size class)` with LRU eviction by entry
//! count. The cache has its own lock and never calls back into the registry
//! or a caller while holding it; entries carry no TTL because the content
//! identity already encodes asset identity.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::size::SizeClass;
use crate::thumb::Thumbnail;

/// Default number of cached images.
pub const DEFAULT_CACHE_CAPACITY: usize = 200;

/// Composite cache key: content identity plus requested size class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub identity: String,
    pub size: SizeClass,
}

impl CacheKey {
    pub fn new(identity: impl Into<String>, size: SizeClass) -> Self {
        Self {
            identity: identity.into(),
            size,
        }
    }
}

struct CacheInner {
    map: HashMap<CacheKey, Arc<Thumbnail>>,
    /// LRU order (front = oldest, back = newest)
    order: VecDeque<CacheKey>,
    capacity: usize,
}

impl CacheInner {
    /// Move a key to the back of the LRU queue (most recently used).
    fn touch(&mut self, key: &CacheKey) {
        self.order.retain(|k| k != key);
        self.order.push_back(key.clone());
    }

    fn evict_to_capacity(&mut self) {
        while self.map.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                debug!(identity = %oldest.identity, size = %oldest.size, "evicting thumbnail");
                self.map.remove(&oldest);
            } else {
                break;
            }
        }
    }
}

/// Thread-safe LRU store of decoded thumbnails.
pub struct ImageCache {
    inner: Mutex<CacheInner>,
}

impl ImageCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                map: HashMap::new(),
                order: VecDeque::new(),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Look up a thumbnail, refreshing its recency on a hit.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<Thumbnail>> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(thumb) = inner.map.get(key).cloned() {
            inner.touch(key);
            Some(thumb)
        } else {
            None
        }
    }

    /// Insert a thumbnail, evicting the least recently used entries when
    /// the cache is at capacity.
    pub fn put(&self, key: CacheKey, thumb: Arc<Thumbnail>) {
        let mut inner = self.inner.lock().unwrap();
        if inner.map.insert(key.clone(), thumb).is_some() {
            inner.touch(&key);
        } else {
            inner.order.push_back(key);
        }
        inner.evict_to_capacity();
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.lock().unwrap().map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry (the "clear cache" user action).
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.map.clear();
        inner.order.clear();
    }

    /// Change the capacity at runtime, evicting down immediately if needed.
    pub fn set_capacity(&self, capacity: usize) {
        let mut inner = self.inner.lock().unwrap();
        inner.capacity = capacity.max(1);
        inner.evict_to_capacity();
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
