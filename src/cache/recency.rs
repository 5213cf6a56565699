//! Bounded Recency Cache Module
//!
//! A fixed-capacity key/value container that evicts the least recently used
//! entry when full.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use lru::LruCache;
use tracing::debug;

use crate::cache::{CacheStats, DEFAULT_CAPACITY};
use crate::config::Config;

// == Bounded Recency Cache ==
/// LRU container bounded by entry count.
///
/// Iteration runs from least to most recently used. Only [`get`](Self::get)
/// promotes an entry; overwriting through [`set`](Self::set) leaves the key
/// where it was.
pub struct BoundedRecencyCache<K, V> {
    /// Recency-ordered storage. Unbounded: capacity is enforced by `set`.
    entries: LruCache<K, V>,
    /// Maximum number of entries, fixed at construction
    capacity: usize,
    /// Performance statistics
    stats: CacheStats,
}

impl<K: Eq + Hash, V> BoundedRecencyCache<K, V> {
    // == Constructor ==
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// Zero is accepted; such a cache always retains the most recent entry.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruCache::unbounded(),
            capacity,
            stats: CacheStats::new(),
        }
    }

    /// Creates a cache sized from `config.capacity`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.capacity)
    }

    // == Get ==
    /// Returns the value for `key`, promoting it to most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.entries.get(key) {
            Some(value) => {
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Returns the value for `key` without touching its recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.peek(key)
    }

    // == Set ==
    /// Inserts or overwrites `key`.
    ///
    /// When the cache already holds `capacity` entries the least recently used
    /// one is evicted first, even if `key` itself is present.
    pub fn set(&mut self, key: K, value: V) -> &mut Self {
        if self.entries.len() >= self.capacity && self.entries.pop_lru().is_some() {
            self.stats.record_eviction();
            debug!(capacity = self.capacity, "evicted least recently used entry");
        }

        match self.entries.peek_mut(&key) {
            Some(slot) => *slot = value,
            None => {
                self.entries.push(key, value);
            }
        }

        self
    }

    // == Remove ==
    /// Removes `key` and returns its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.pop(key)
    }

    /// Removes `key`, returning whether it was present.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove(key).is_some()
    }

    /// Removes every entry. Counters in [`stats`](Self::stats) are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Inspection ==
    /// Whether `key` is stored. Does not affect recency.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains(key)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries set at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Iteration ==
    /// Iterates entries from least to most recently used.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().rev()
    }

    /// Iterates keys from least to most recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Iterates values from least to most recently used.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }
}

impl<K: Eq + Hash, V> Default for BoundedRecencyCache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<K: Eq + Hash, V> fmt::Debug for BoundedRecencyCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedRecencyCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn contents(cache: &BoundedRecencyCache<&'static str, i32>) -> Vec<(&'static str, i32)> {
        cache.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_new_is_empty() {
        let cache: BoundedRecencyCache<&str, i32> = BoundedRecencyCache::new(3);
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.capacity(), 3);
    }

    #[test]
    fn test_default_capacity() {
        let cache: BoundedRecencyCache<String, String> = BoundedRecencyCache::default();
        assert_eq!(cache.capacity(), 100);
    }

    #[test]
    fn test_set_and_get() {
        let mut cache = BoundedRecencyCache::new(2);
        cache.set("a", 1).set("b", 2);

        assert_eq!(cache.get("a"), Some(&1));
        assert_eq!(cache.get("b"), Some(&2));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_string_keys_lookup_by_str() {
        let mut cache = BoundedRecencyCache::new(2);
        cache.set("key".to_string(), 7);

        assert_eq!(cache.get("key"), Some(&7));
        assert!(cache.contains_key("key"));
    }

    #[test]
    fn test_evicts_oldest_when_full() {
        let mut cache = BoundedRecencyCache::new(3);
        cache.set("k1", 1).set("k2", 2).set("k3", 3).set("k4", 4);

        assert_eq!(contents(&cache), vec![("k2", 2), ("k3", 3), ("k4", 4)]);
        assert!(!cache.contains_key("k1"));
    }

    #[test]
    fn test_get_promotes_entry() {
        let mut cache = BoundedRecencyCache::new(2);
        cache.set("a", 1).set("b", 2);
        cache.get("a");
        cache.set("c", 3);

        assert_eq!(contents(&cache), vec![("a", 1), ("c", 3)]);
    }

    #[test]
    fn test_get_missing_key_has_no_side_effect() {
        let mut cache = BoundedRecencyCache::new(2);
        cache.set("a", 1).set("b", 2);
        cache.get("zzz");

        assert_eq!(contents(&cache), vec![("a", 1), ("b", 2)]);
    }

    #[test]
    fn test_peek_does_not_promote() {
        let mut cache = BoundedRecencyCache::new(2);
        cache.set("a", 1).set("b", 2);
        assert_eq!(cache.peek("a"), Some(&1));
        cache.set("c", 3);

        assert_eq!(contents(&cache), vec![("b", 2), ("c", 3)]);
    }

    #[test]
    fn test_overwrite_below_capacity_keeps_position() {
        let mut cache = BoundedRecencyCache::new(3);
        cache.set("a", 1).set("b", 2).set("a", 10);

        assert_eq!(contents(&cache), vec![("a", 10), ("b", 2)]);
    }

    #[test]
    fn test_overwrite_at_capacity_still_evicts() {
        let mut cache = BoundedRecencyCache::new(2);
        cache.set("a", 1).set("b", 2);

        // "b" exists, but the cache is full so "a" goes first
        cache.set("b", 20);

        assert_eq!(contents(&cache), vec![("b", 20)]);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_overwrite_of_oldest_at_capacity_reinserts_at_tail() {
        let mut cache = BoundedRecencyCache::new(2);
        cache.set("a", 1).set("b", 2);
        cache.set("a", 10);

        assert_eq!(contents(&cache), vec![("b", 2), ("a", 10)]);
    }

    #[test]
    fn test_single_entry_overwrite_at_capacity() {
        let mut cache = BoundedRecencyCache::new(1);
        cache.set("a", 1).set("a", 2);

        assert_eq!(contents(&cache), vec![("a", 2)]);
    }

    #[test]
    fn test_zero_capacity_keeps_latest_entry() {
        let mut cache = BoundedRecencyCache::new(0);
        cache.set("a", 1);
        assert_eq!(cache.len(), 1);

        cache.set("b", 2);
        assert_eq!(contents(&cache), vec![("b", 2)]);
    }

    #[test]
    fn test_remove_and_delete() {
        let mut cache = BoundedRecencyCache::new(3);
        cache.set("a", 1).set("b", 2);

        assert_eq!(cache.remove("a"), Some(1));
        assert!(cache.delete("b"));
        assert!(!cache.delete("b"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut cache = BoundedRecencyCache::new(3);
        cache.set("a", 1).set("b", 2);

        cache.clear();
        assert_eq!(cache.len(), 0);

        cache.clear();
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_keys_and_values_follow_recency() {
        let mut cache = BoundedRecencyCache::new(3);
        cache.set("a", 1).set("b", 2).set("c", 3);
        cache.get("a");

        let keys: Vec<_> = cache.keys().copied().collect();
        let values: Vec<_> = cache.values().copied().collect();
        assert_eq!(keys, vec!["b", "c", "a"]);
        assert_eq!(values, vec![2, 3, 1]);
    }

    #[test]
    fn test_stats_track_hits_misses_evictions() {
        let mut cache = BoundedRecencyCache::new(1);
        cache.set("a", 1);
        cache.get("a");
        cache.get("b");
        cache.set("b", 2);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.total_entries, 1);
    }
}
