use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

/// Internal cache entry with recency stamp
struct CacheEntry<V> {
    data: V,
    last_used: u64,
}

struct Inner<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    clock: u64,
}

/// Thread-safe, fixed-capacity cache with least-recently-used eviction.
///
/// Entries never expire; they only leave when capacity is exceeded.
pub struct LruCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::with_capacity(capacity),
                clock: 0,
            }),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        // No invariant spans a panic inside the critical sections below.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Look up `key`, marking it as most recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.lock();
        inner.clock += 1;
        let now = inner.clock;
        inner.entries.get_mut(key).map(|entry| {
            entry.last_used = now;
            entry.data.clone()
        })
    }

    /// Insert or replace `key`, evicting the least recently used entry when full.
    pub fn insert(&self, key: K, value: V) {
        let mut inner = self.lock();
        inner.clock += 1;
        let now = inner.clock;

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.capacity {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                inner.entries.remove(&oldest);
                tracing::debug!("LRU cache full ({} entries), evicted oldest entry", self.capacity);
            }
        }

        inner.entries.insert(
            key,
            CacheEntry {
                data: value,
                last_used: now,
            },
        );
    }

    pub fn contains(&self, key: &K) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
