//! Cache Backend
//!
//! Storage behind the cache-aside decorators.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

/// Key/value storage with per-entry expiry.
///
/// Values are JSON so an out-of-process cache can hold them as well.
/// Operations are infallible to callers: a backend that cannot serve a
/// request behaves as a miss.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Value for a key if present and not expired
    async fn get(&self, key: &str) -> Option<Value>;

    /// Store a value that expires after `ttl`
    async fn set(&self, key: &str, value: Value, ttl: Duration);

    async fn remove(&self, key: &str);

    /// Drop every entry
    async fn clear(&self);
}
