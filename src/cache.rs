use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Shared key-value store capability: exact-match get, all-or-nothing set
/// with a per-entry TTL. Values are serialized JSON so a swap to an external
/// store stays a drop-in.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String, ttl: Duration);
}

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// In-process implementation. Expiry is lazy: an aged entry is dropped on
/// the read that finds it.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, e| e.expires_at <= Instant::now());
        }
        None
    }

    fn set(&self, key: &str, value: String, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_what_set_stored() {
        let cache = MemoryCache::new();
        cache.set("movie-123", "{\"a\":1}".into(), Duration::from_secs(60));
        assert_eq!(cache.get("movie-123").as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn missing_key_is_a_miss() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("episode-9"), None);
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = MemoryCache::new();
        cache.set("movie-123", "old".into(), Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("movie-123"), None);
    }

    #[test]
    fn set_overwrites_previous_value() {
        let cache = MemoryCache::new();
        cache.set("k", "first".into(), Duration::from_secs(60));
        cache.set("k", "second".into(), Duration::from_secs(60));
        assert_eq!(cache.get("k").as_deref(), Some("second"));
    }
}
