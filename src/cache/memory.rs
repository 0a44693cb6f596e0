//! In-Process Cache
//!
//! Bounded map with per-entry expiry. When full, expired entries go first,
//! then the oldest insertion.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;

use super::CacheBackend;

/// Default maximum number of entries
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Longest lifetime an entry can get; longer TTLs are cut to this
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    inserted_at: Instant,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of entries, expired ones included until evicted
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

/// In-process cache backend
#[derive(Debug)]
pub struct MemoryCache {
    capacity: usize,
    entries: Mutex<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MemoryCache {
    /// Create a cache holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries().len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn make_room(entries: &mut HashMap<String, CacheEntry>, capacity: usize, now: Instant) {
        if entries.len() < capacity {
            return;
        }

        entries.retain(|_, entry| !entry.is_expired(now));

        while entries.len() >= capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        let mut entries = self.entries();

        let value = match entries.get(key).map(|entry| entry.is_expired(now)) {
            Some(true) => {
                entries.remove(key);
                None
            }
            Some(false) => entries.get(key).map(|entry| entry.value.clone()),
            None => None,
        };

        let counter = if value.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        value
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries();

        if !entries.contains_key(key) {
            Self::make_room(&mut entries, self.capacity, now);
        }
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: now,
                expires_at: now + ttl.min(MAX_TTL),
            },
        );
    }

    async fn remove(&self, key: &str) {
        self.entries().remove(key);
    }

    async fn clear(&self) {
        self.entries().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_after_set() {
        let cache = MemoryCache::new(4);
        cache.set("Car:all-active", json!([1, 2]), Duration::from_secs(60)).await;

        assert_eq!(cache.get("Car:all-active").await, Some(json!([1, 2])));
        assert_eq!(cache.get("Car:by-id:x").await, None);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_ttl_is_capped() {
        let cache = MemoryCache::new(4);
        cache.set("k", json!("v"), Duration::MAX).await;
        assert!(cache.get("k").await.is_some());

        tokio::time::advance(MAX_TTL).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache = MemoryCache::new(4);
        cache.set("k", json!("v"), Duration::from_secs(300)).await;

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.get("k").await.is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("k").await.is_none());
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_cache_evicts_expired_then_oldest() {
        let cache = MemoryCache::new(2);
        cache.set("short", json!(1), Duration::from_secs(1)).await;
        tokio::time::advance(Duration::from_millis(10)).await;
        cache.set("long", json!(2), Duration::from_secs(60)).await;

        tokio::time::advance(Duration::from_secs(2)).await;
        cache.set("third", json!(3), Duration::from_secs(60)).await;
        assert!(cache.get("long").await.is_some());
        assert!(cache.get("third").await.is_some());

        tokio::time::advance(Duration::from_millis(10)).await;
        cache.set("fourth", json!(4), Duration::from_secs(60)).await;
        assert!(cache.get("long").await.is_none());
        assert!(cache.get("third").await.is_some());
        assert!(cache.get("fourth").await.is_some());
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let cache = MemoryCache::new(4);
        cache.set("a", json!(1), Duration::from_secs(60)).await;
        cache.set("b", json!(2), Duration::from_secs(60)).await;

        cache.remove("a").await;
        assert!(cache.get("a").await.is_none());
        assert!(cache.get("b").await.is_some());

        cache.clear().await;
        assert_eq!(cache.stats().size, 0);
    }
}
