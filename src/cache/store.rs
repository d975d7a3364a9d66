//! Cache Store Module
//!
//! Synchronous engine combining HashMap storage with recency tracking and
//! lazy TTL expiration. Time is passed in by the caller.

use std::collections::HashMap;
use std::time::Duration;

use tracing::trace;

use crate::cache::{CacheEntry, CacheStats, RecencyIndex};
use crate::config::CacheConfig;
use crate::error::Result;

// == Cache Store ==
/// Resolved-value storage with LRU eviction and TTL support.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU ordering
    recency: RecencyIndex,
    /// Activity counters
    stats: CacheStats,
    /// Validated parameters
    config: CacheConfig,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a store, failing on an invalid configuration.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            entries: HashMap::new(),
            recency: RecencyIndex::new(),
            stats: CacheStats::new(),
            config,
        })
    }

    // == Insert ==
    /// Stores a value written at `now`, replacing any existing entry.
    ///
    /// The key becomes most recently used. If the store holds more than
    /// `max_entries` afterwards, least recently used entries are dropped.
    pub fn insert(&mut self, key: String, value: V, ttl: Option<Duration>, now: u64) {
        let ttl = ttl.unwrap_or(self.config.default_ttl);
        let entry = CacheEntry::new(value, now, ttl);

        self.recency.touch(&key);
        self.entries.insert(key, entry);
        self.enforce_capacity(now);
    }

    // == Get ==
    /// Returns a live value and marks it most recently used.
    ///
    /// A stale entry is removed and reported as a miss.
    pub fn get(&mut self, key: &str, now: u64) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_expiration();
            self.stats.record_miss();
            trace!(key, "expired entry purged on read");
            return None;
        }

        self.recency.touch(key);
        self.stats.record_hit();
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Remove ==
    /// Removes an entry. Returns true if one was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.remove_entry(key)
    }

    // == Purge Expired ==
    /// Removes every entry that is stale at `now`. Returns the count removed.
    pub fn purge_expired(&mut self, now: u64) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_entry(key);
            self.stats.record_expiration();
        }
        expired.len()
    }

    // == Live Length ==
    /// Number of entries not yet expired at `now`.
    pub fn live_len(&self, now: u64) -> usize {
        self.entries
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    /// Number of stored records, including stale ones not yet purged.
    pub fn stored_len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn contains_live(&self, key: &str, now: u64) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Remaining lifetime of a live entry, without touching recency.
    pub fn ttl_remaining_ms(&self, key: &str, now: u64) -> Option<u64> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.ttl_remaining_ms(now))
    }

    // == Stats ==
    /// Snapshot of the counters with `total_entries` computed at `now`.
    pub fn stats(&self, now: u64) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.total_entries = self.live_len(now);
        stats
    }

    pub fn stats_mut(&mut self) -> &mut CacheStats {
        &mut self.stats
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Capacity ==
    /// Drops stale entries, then least recently used ones, until the store fits.
    fn enforce_capacity(&mut self, now: u64) {
        if self.entries.len() <= self.config.max_entries {
            return;
        }

        let purged = self.purge_expired(now);
        if purged > 0 {
            trace!(purged, "stale entries purged before eviction");
        }

        while self.entries.len() > self.config.max_entries {
            let Some(victim) = self.recency.pop_oldest() else {
                break;
            };
            if self.entries.remove(&victim).is_some() {
                self.stats.record_eviction();
                trace!(key = %victim, "evicted least recently used entry");
            }
        }
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        self.recency.remove(key);
        self.entries.remove(key).is_some()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;

    const TTL: Duration = Duration::from_millis(100);

    fn store(max_entries: usize) -> CacheStore<String> {
        CacheStore::new(CacheConfig::new(max_entries, TTL)).unwrap()
    }

    #[test]
    fn test_store_rejects_zero_capacity() {
        let result = CacheStore::<String>::new(CacheConfig::new(0, TTL));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_insert_and_get() {
        let mut store = store(10);

        store.insert("g1:rust".into(), "concepts".into(), None, 1000);

        assert_eq!(store.get("g1:rust", 1000).as_deref(), Some("concepts"));
        assert_eq!(store.live_len(1000), 1);
    }

    #[test]
    fn test_get_missing() {
        let mut store = store(10);

        assert_eq!(store.get("nope", 0), None);
        assert_eq!(store.stats(0).misses, 1);
    }

    #[test]
    fn test_overwrite_replaces_value_and_expiry() {
        let mut store = store(10);

        store.insert("k".into(), "v1".into(), None, 1000);
        store.insert("k".into(), "v2".into(), Some(Duration::from_millis(500)), 1050);

        assert_eq!(store.stored_len(), 1);
        assert_eq!(store.get("k", 1200).as_deref(), Some("v2"));
        assert_eq!(store.ttl_remaining_ms("k", 1200), Some(350));
    }

    #[test]
    fn test_expired_entry_is_purged_on_read() {
        let mut store = store(10);

        store.insert("k".into(), "v".into(), None, 1000);

        assert_eq!(store.get("k", 1150), None);
        assert_eq!(store.stored_len(), 0);

        let stats = store.stats(1150);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_reads_do_not_extend_expiry() {
        let mut store = store(10);

        store.insert("k".into(), "v".into(), None, 1000);
        assert!(store.get("k", 1090).is_some());

        assert_eq!(store.get("k", 1100), None);
    }

    #[test]
    fn test_lru_eviction_respects_reads() {
        let mut store = store(2);

        store.insert("a".into(), "1".into(), None, 0);
        store.insert("b".into(), "2".into(), None, 0);
        store.get("a", 0);
        store.insert("c".into(), "3".into(), None, 0);

        assert!(store.contains_live("a", 0));
        assert!(!store.contains_live("b", 0));
        assert!(store.contains_live("c", 0));
        assert_eq!(store.stats(0).evictions, 1);
    }

    #[test]
    fn test_stale_victim_counts_as_expiration() {
        let mut store = store(1);

        store.insert("a".into(), "1".into(), None, 0);
        store.insert("b".into(), "2".into(), None, 500);

        let stats = store.stats(500);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_stale_entries_make_room_before_live_ones_are_evicted() {
        let mut store = store(2);

        store.insert("live".into(), "1".into(), Some(Duration::from_secs(10)), 0);
        store.insert("stale".into(), "2".into(), Some(Duration::from_millis(10)), 0);
        store.insert("new".into(), "3".into(), None, 50);

        assert!(store.contains_live("live", 50));
        assert!(store.contains_live("new", 50));
        assert_eq!(store.stored_len(), 2);

        let stats = store.stats(50);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.expirations, 1);
    }

    #[test]
    fn test_live_len_excludes_stale_entries() {
        let mut store = store(10);

        store.insert("short".into(), "1".into(), Some(Duration::from_millis(10)), 0);
        store.insert("long".into(), "2".into(), Some(Duration::from_secs(10)), 0);

        assert_eq!(store.live_len(5), 2);
        assert_eq!(store.live_len(20), 1);
        assert_eq!(store.stored_len(), 2);
    }

    #[test]
    fn test_purge_expired() {
        let mut store = store(10);

        store.insert("short".into(), "1".into(), Some(Duration::from_millis(10)), 0);
        store.insert("long".into(), "2".into(), Some(Duration::from_secs(10)), 0);

        assert_eq!(store.purge_expired(20), 1);
        assert_eq!(store.stored_len(), 1);
        assert!(store.contains_live("long", 20));
    }

    #[test]
    fn test_remove() {
        let mut store = store(10);

        store.insert("k".into(), "v".into(), None, 0);

        assert!(store.remove("k"));
        assert!(!store.remove("k"));
        assert_eq!(store.get("k", 0), None);
    }
}
