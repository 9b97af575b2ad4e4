use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// LRU map keyed by exact input string, safe to share behind `&self`.
/// A capacity of zero turns every call into a miss.
pub(crate) struct BoundedCache<V> {
    inner: Option<Mutex<LruCache<String, V>>>,
}

impl<V: Clone> BoundedCache<V> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self { inner: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))) }
    }

    pub(crate) fn get(&self, key: &str) -> Option<V> {
        self.inner.as_ref()?.lock().get(key).cloned()
    }

    pub(crate) fn insert(&self, key: String, value: V) {
        if let Some(cache) = &self.inner {
            cache.lock().put(key, value);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |cache| cache.lock().len())
    }
}
