//! In-memory TTL cache for GitLab API responses
//!
//! Stores serialized response bodies keyed by a request fingerprint.
//! Each entry carries its own expiry: an expired entry behaves exactly
//! like an absent one on read and is evicted at that point.
//!
//! The cache itself is not synchronized. Consumers that share it across
//! tasks wrap it in `Arc<Mutex<ApiCache>>`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A cached API response body.
///
/// The body is the serialized JSON of the mapped response, stored as a
/// string so the cache stays independent of the client's value types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub body: String,
}

#[derive(Debug)]
struct CacheEntry {
    response: CachedResponse,
    expires_at: Instant,
}

/// Counters for external reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from a live entry.
    pub hits: u64,
    /// Lookups that found nothing, or only an expired entry.
    pub misses: u64,
    /// Entries currently stored (live and not-yet-evicted expired).
    pub entries: usize,
}

/// In-memory response cache with per-entry TTL.
#[derive(Debug, Default)]
pub struct ApiCache {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl ApiCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a response by fingerprint.
    ///
    /// An expired entry counts as a miss and is removed.
    pub fn get(&mut self, key: &str) -> Option<CachedResponse> {
        match self.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                self.hits += 1;
                Some(entry.response.clone())
            }
            Some(_) => {
                self.entries.remove(key);
                self.misses += 1;
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store a response under the given fingerprint for `ttl`.
    ///
    /// Replaces any previous entry under the same key, including its expiry.
    pub fn set(&mut self, key: &str, response: CachedResponse, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                response,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drop all expired entries eagerly.
    pub fn purge_expired(&mut self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &str) -> CachedResponse {
        CachedResponse {
            body: body.to_string(),
        }
    }

    #[test]
    fn test_get_returns_stored_response() {
        let mut cache = ApiCache::new();
        cache.set("key", response("[1,2,3]"), Duration::from_secs(60));

        assert_eq!(cache.get("key"), Some(response("[1,2,3]")));
        assert_eq!(cache.get("other"), None);
    }

    #[test]
    fn test_expired_entry_behaves_like_absent() {
        let mut cache = ApiCache::new();
        cache.set("key", response("{}"), Duration::ZERO);

        assert_eq!(cache.get("key"), None);
        // The expired entry was evicted on read.
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_replaces_previous_entry() {
        let mut cache = ApiCache::new();
        cache.set("key", response("old"), Duration::from_secs(60));
        cache.set("key", response("new"), Duration::from_secs(60));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("key"), Some(response("new")));
    }

    #[test]
    fn test_purge_expired_keeps_live_entries() {
        let mut cache = ApiCache::new();
        cache.set("dead", response("a"), Duration::ZERO);
        cache.set("live", response("b"), Duration::from_secs(60));

        cache.purge_expired();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("live"), Some(response("b")));
    }

    #[test]
    fn test_stats_count_hits_and_misses() {
        let mut cache = ApiCache::new();
        cache.set("key", response("{}"), Duration::from_secs(60));

        cache.get("key");
        cache.get("key");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }
}
