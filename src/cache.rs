//! LRU query-response cache with TTL
//!
//! Caches sampled-summation responses keyed by `(period, points)`. The TTL
//! is set to the aggregation interval so a cached response is never staler
//! than one aggregation cycle. Pattern invalidation clears every key under
//! a prefix (admin cache-clear). Lookups that miss simply recompute; the
//! cache is an optimization, never a source of errors.

use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    cached_at: DateTime<Utc>,
}

/// LRU cache with per-instance TTL
pub struct QueryCache<V: Clone> {
    cache: Mutex<LruCache<String, CacheEntry<V>>>,
    ttl: Duration,
}

impl<V: Clone> QueryCache<V> {
    /// Create a cache with the given capacity and entry TTL (seconds)
    pub fn new(capacity: usize, ttl_seconds: i64) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(256).unwrap());
        Self {
            cache: Mutex::new(LruCache::new(cap)),
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    /// Get a cached value if it exists and hasn't expired
    pub fn get(&self, key: &str) -> Option<V> {
        let mut cache = self.cache.lock();

        if let Some(entry) = cache.get(key) {
            let age = Utc::now() - entry.cached_at;
            if age < self.ttl {
                tracing::trace!(key = key, age_secs = age.num_seconds(), "Cache hit");
                return Some(entry.value.clone());
            }
            tracing::trace!(key = key, "Cache entry expired");
            cache.pop(key);
        }

        None
    }

    /// Insert a value into the cache
    pub fn insert(&self, key: String, value: V) {
        let entry = CacheEntry {
            value,
            cached_at: Utc::now(),
        };

        let mut cache = self.cache.lock();
        cache.put(key.clone(), entry);

        tracing::trace!(key = key, "Cache insert");
    }

    /// Remove every key that starts with the given prefix
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut cache = self.cache.lock();
        let keys: Vec<String> = cache
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect();

        for key in &keys {
            cache.pop(key);
        }

        tracing::debug!(prefix = prefix, removed = keys.len(), "Cache prefix invalidated");
        keys.len()
    }

    /// Clear all entries
    pub fn clear(&self) {
        let mut cache = self.cache.lock();
        cache.clear();
        tracing::debug!("Cache cleared");
    }

    /// Current number of entries
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }
}

/// Deterministic cache key for a sampled-summations query
pub fn summations_key(period: &str, points: usize) -> String {
    format!("summations:{}:{}", period, points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_insert_and_get() {
        let cache: QueryCache<i32> = QueryCache::new(10, 3600);

        cache.insert(summations_key("1d", 12), 42);

        assert_eq!(cache.get(&summations_key("1d", 12)), Some(42));
        assert_eq!(cache.get(&summations_key("1d", 24)), None);
    }

    #[test]
    fn test_cache_expiry() {
        // 0-second TTL expires immediately
        let cache: QueryCache<i32> = QueryCache::new(10, 0);

        cache.insert("k".to_string(), 1);
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_prefix_invalidation() {
        let cache: QueryCache<i32> = QueryCache::new(10, 3600);

        cache.insert(summations_key("1d", 12), 1);
        cache.insert(summations_key("7d", 12), 2);
        cache.insert("pools:24".to_string(), 3);

        let removed = cache.invalidate_prefix("summations:");
        assert_eq!(removed, 2);
        assert_eq!(cache.get(&summations_key("1d", 12)), None);
        assert_eq!(cache.get("pools:24"), Some(3));
    }

    #[test]
    fn test_lru_eviction() {
        let cache: QueryCache<i32> = QueryCache::new(2, 3600);

        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        cache.insert("c".to_string(), 3);

        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn test_key_is_deterministic() {
        assert_eq!(summations_key("7d", 48), "summations:7d:48");
    }
}
