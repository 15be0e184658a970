//! In-memory cache keyed by string cache keys.
//!
//! Values are stored as JSON so one cache holds every cached type. Entries
//! expire after the configured TTL; expired entries read as misses and are
//! dropped by [`MemoryCache::prune_expired`].

pub mod keys;

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

struct Entry {
    value: serde_json::Value,
    expires_at: Instant,
}

/// Concurrent TTL cache.
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
    ttl: Duration,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Read a value. Missing, expired or undecodable entries are misses.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = self.entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        match serde_json::from_value(entry.value.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Read several values; only hits appear in the result.
    pub fn multi_get<T: DeserializeOwned>(&self, keys: &[String]) -> HashMap<String, T> {
        keys.iter()
            .filter_map(|key| self.get(key).map(|value| (key.clone(), value)))
            .collect()
    }

    /// Store a value, replacing any previous entry.
    pub fn set<T: Serialize>(&self, key: impl Into<String>, value: &T) {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.entries.insert(
                    key,
                    Entry {
                        value,
                        expires_at: Instant::now() + self.ttl,
                    },
                );
            }
            Err(e) => warn!(key = %key, error = %e, "Failed to encode cache entry"),
        }
    }

    /// Delete a key. Returns whether an entry was present.
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        crate::metrics::record_cache_invalidation(key);
        debug!(key = %key, removed, "Cache key invalidated");
        removed
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_delete() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        cache.set("SystemAdministratorIds", &vec![1i64, 2]);

        let ids: Option<Vec<i64>> = cache.get("SystemAdministratorIds");
        assert_eq!(ids, Some(vec![1, 2]));

        assert!(cache.delete("SystemAdministratorIds"));
        assert!(!cache.delete("SystemAdministratorIds"));
        assert_eq!(cache.get::<Vec<i64>>("SystemAdministratorIds"), None);
    }

    #[test]
    fn multi_get_returns_hits_only() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        cache.set("HashTag:#a", &1i64);

        let hits: HashMap<String, i64> =
            cache.multi_get(&["HashTag:#a".to_string(), "HashTag:#b".to_string()]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits["HashTag:#a"], 1);
    }

    #[test]
    fn expired_entries_miss_and_prune() {
        let cache = MemoryCache::new(Duration::ZERO);
        cache.set("k", &"v");

        assert_eq!(cache.get::<String>("k"), None);
        assert_eq!(cache.prune_expired(), 1);
        assert_eq!(cache.prune_expired(), 0);
    }

    #[test]
    fn wrong_type_is_a_miss() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        cache.set("k", &"text");
        assert_eq!(cache.get::<i64>("k"), None);
    }
}
