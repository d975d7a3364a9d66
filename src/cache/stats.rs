//! Cache Statistics Module
//!
//! Counters describing how requests were served.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups served from a live entry
    pub hits: u64,
    /// Lookups that found nothing usable
    pub misses: u64,
    /// Entries removed to make room (LRU)
    pub evictions: u64,
    /// Stale entries purged on read, insert, or sweep
    pub expirations: u64,
    /// Callers that joined an in-flight request instead of starting one
    pub coalesced: u64,
    /// Factory invocations
    pub factory_calls: u64,
    /// Factory invocations that failed
    pub factory_failures: u64,
    /// Entries not yet expired
    pub total_entries: usize,
    /// Requests currently in flight
    pub in_flight: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// hits / (hits + misses), or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub fn record_coalesced(&mut self) {
        self.coalesced += 1;
    }

    pub fn record_factory_call(&mut self) {
        self.factory_calls += 1;
    }

    pub fn record_factory_failure(&mut self) {
        self.factory_failures += 1;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats, CacheStats::default());
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_factory_counters() {
        let mut stats = CacheStats::new();
        stats.record_factory_call();
        stats.record_factory_call();
        stats.record_factory_failure();
        stats.record_coalesced();

        assert_eq!(stats.factory_calls, 2);
        assert_eq!(stats.factory_failures, 1);
        assert_eq!(stats.coalesced, 1);
    }

    #[test]
    fn test_stats_serialize() {
        let mut stats = CacheStats::new();
        stats.record_eviction();
        stats.record_expiration();

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["evictions"], 1);
        assert_eq!(json["expirations"], 1);
        assert_eq!(json["in_flight"], 0);
    }
}
