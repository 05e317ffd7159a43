//! Cache Store Module
//!
//! Bounded key-value map with TTL expiration and oldest-insertion eviction.

use std::collections::HashMap;

use crate::cache::{current_timestamp_ms, CacheEntry, CacheStats, InsertionOrder, MAX_KEY_LENGTH};
use crate::error::{Result, SppoError};

// == Cache Store ==
/// A single cache namespace.
///
/// When a new key arrives and the store is full, expired entries are swept
/// first; if that frees nothing, the oldest insertion is evicted.
#[derive(Debug)]
pub struct CacheStore<V> {
    entries: HashMap<String, CacheEntry<V>>,
    order: InsertionOrder,
    stats: CacheStats,
    max_entries: usize,
    default_ttl: u64,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of keys the namespace can hold
    /// * `default_ttl` - TTL in seconds for entries set without one
    pub fn new(max_entries: usize, default_ttl: u64) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            stats: CacheStats::new(),
            max_entries,
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    // == Set ==
    /// Stores a value with optional TTL (falls back to the default TTL).
    ///
    /// Overwriting an existing key resets its TTL and never evicts. Fails
    /// without touching the store when the key is too long or the store has
    /// zero capacity.
    pub fn set(&mut self, key: String, value: V, ttl: Option<u64>) -> Result<()> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(SppoError::Cache(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }

        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite && self.entries.len() >= self.max_entries {
            if self.max_entries == 0 {
                return Err(SppoError::Cache("Cache has zero capacity".to_string()));
            }
            if self.cleanup_expired() == 0 {
                if let Some(evicted_key) = self.order.pop_oldest() {
                    self.entries.remove(&evicted_key);
                    self.stats.record_eviction();
                }
            }
        }

        let entry = CacheEntry::new(value, ttl.unwrap_or(self.default_ttl));
        self.entries.insert(key.clone(), entry);
        self.order.record_write(&key);

        Ok(())
    }

    // == Get ==
    /// Retrieves a live value by key.
    ///
    /// Expired entries are dropped on read and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = current_timestamp_ms();
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                self.stats.record_hit();
                Some(entry.value.clone())
            }
            Some(_) => {
                self.entries.remove(key);
                self.order.remove(key);
                self.stats.record_miss();
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether a key was present.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.remove(key);
            true
        } else {
            false
        }
    }

    // == Clear ==
    /// Drops every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.keys = self.entries.len();
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.order.remove(key);
        }

        expired_keys.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    fn store(max: usize) -> CacheStore<String> {
        CacheStore::new(max, 300)
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = store(100);

        store.set("key1".to_string(), "value1".to_string(), None).unwrap();

        assert_eq!(store.get("key1"), Some("value1".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = store(100);
        assert_eq!(store.get("nonexistent"), None);
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_store_delete() {
        let mut store = store(100);

        store.set("key1".to_string(), "value1".to_string(), None).unwrap();
        assert!(store.delete("key1"));
        assert!(!store.delete("key1"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_overwrite_does_not_evict() {
        let mut store = store(2);

        store.set("key1".to_string(), "a".to_string(), None).unwrap();
        store.set("key2".to_string(), "b".to_string(), None).unwrap();
        store.set("key1".to_string(), "c".to_string(), None).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("key1"), Some("c".to_string()));
        assert_eq!(store.get("key2"), Some("b".to_string()));
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_store_ttl_expiration() {
        let mut store = store(100);

        store.set("key1".to_string(), "value1".to_string(), Some(1)).unwrap();
        assert!(store.get("key1").is_some());

        sleep(Duration::from_millis(1100));

        // Not swept yet, still must not be returned
        assert_eq!(store.get("key1"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_evicts_oldest_insertion() {
        let mut store = store(3);

        store.set("key1".to_string(), "value1".to_string(), None).unwrap();
        store.set("key2".to_string(), "value2".to_string(), None).unwrap();
        store.set("key3".to_string(), "value3".to_string(), None).unwrap();

        // Reads do not protect key1 from eviction
        store.get("key1");
        store.set("key4".to_string(), "value4".to_string(), None).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.get("key1"), None);
        assert!(store.get("key2").is_some());
        assert!(store.get("key4").is_some());
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_store_full_prefers_sweeping_expired() {
        let mut store = store(2);

        store.set("short".to_string(), "x".to_string(), Some(1)).unwrap();
        store.set("long".to_string(), "y".to_string(), None).unwrap();
        sleep(Duration::from_millis(1100));

        store.set("new".to_string(), "z".to_string(), None).unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.get("long").is_some());
        assert!(store.get("new").is_some());
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_store_zero_capacity_rejects() {
        let mut store = store(0);

        let result = store.set("key".to_string(), "v".to_string(), None);
        assert!(matches!(result, Err(SppoError::Cache(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_key_too_long() {
        let mut store = store(100);
        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);

        let result = store.set(long_key, "value".to_string(), None);
        assert!(matches!(result, Err(SppoError::Cache(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_cleanup_expired() {
        let mut store = store(100);

        store.set("key1".to_string(), "value1".to_string(), Some(1)).unwrap();
        store.set("key2".to_string(), "value2".to_string(), Some(10)).unwrap();

        sleep(Duration::from_millis(1100));

        assert_eq!(store.cleanup_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("key2").is_some());
    }

    #[test]
    fn test_store_clear() {
        let mut store = store(100);
        store.set("a".to_string(), "1".to_string(), None).unwrap();
        store.set("b".to_string(), "2".to_string(), None).unwrap();

        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.get("a"), None);
    }
}
