//! Entity Cache Handle
//!
//! The narrow interface a decorator uses to talk to the cache: read-through
//! lookups and named invalidations within one entity namespace.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::domain::Entity;
use crate::store::StoreResult;

use super::{CacheBackend, CacheKey, CacheTtl};

/// Cache access scoped to one entity type
#[derive(Clone)]
pub struct EntityCache {
    backend: Arc<dyn CacheBackend>,
    namespace: &'static str,
    ttl: CacheTtl,
}

impl std::fmt::Debug for EntityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityCache")
            .field("namespace", &self.namespace)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl EntityCache {
    /// Handle for the namespace of `T`
    pub fn for_entity<T: Entity>(backend: Arc<dyn CacheBackend>, ttl: CacheTtl) -> Self {
        Self {
            backend,
            namespace: T::KIND,
            ttl,
        }
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    /// Serve `key` from the cache, or load, cache and return it
    pub async fn read_through<V, F, Fut>(&self, key: CacheKey, load: F) -> StoreResult<V>
    where
        V: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = StoreResult<V>> + Send,
    {
        let rendered = key.render(self.namespace);
        if let Some(hit) = self.lookup(&rendered).await {
            return Ok(hit);
        }

        let value = load().await?;
        self.fill(&rendered, &value, &key).await;
        Ok(value)
    }

    /// Like [`read_through`](Self::read_through); absent results are not cached
    pub async fn read_through_optional<V, F, Fut>(
        &self,
        key: CacheKey,
        load: F,
    ) -> StoreResult<Option<V>>
    where
        V: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = StoreResult<Option<V>>> + Send,
    {
        let rendered = key.render(self.namespace);
        if let Some(hit) = self.lookup(&rendered).await {
            return Ok(Some(hit));
        }

        let value = load().await?;
        if let Some(found) = &value {
            self.fill(&rendered, found, &key).await;
        }
        Ok(value)
    }

    async fn lookup<V: DeserializeOwned>(&self, key: &str) -> Option<V> {
        let raw = match self.backend.get(key).await {
            Some(raw) => raw,
            None => {
                tracing::debug!(key, "Cache miss");
                return None;
            }
        };

        match serde_json::from_value(raw) {
            Ok(value) => {
                tracing::debug!(key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                tracing::debug!(key, error = %e, "Discarding undecodable cache entry");
                self.backend.remove(key).await;
                None
            }
        }
    }

    async fn fill<V: Serialize>(&self, rendered: &str, value: &V, key: &CacheKey) {
        match serde_json::to_value(value) {
            Ok(raw) => self.backend.set(rendered, raw, self.ttl.for_key(key)).await,
            Err(e) => tracing::debug!(key = rendered, error = %e, "Skipping cache fill"),
        }
    }

    async fn invalidate(&self, key: CacheKey) {
        let rendered = key.render(self.namespace);
        tracing::debug!(key = %rendered, "Cache invalidate");
        self.backend.remove(&rendered).await;
    }

    pub async fn invalidate_all_active(&self) {
        self.invalidate(CacheKey::AllActive).await;
    }

    pub async fn invalidate_by_id(&self, id: Uuid) {
        self.invalidate(CacheKey::ById(id)).await;
    }

    /// "all-active" and "by-id", the keys every write to an entity clears
    pub async fn invalidate_entity(&self, id: Uuid) {
        self.invalidate_all_active().await;
        self.invalidate_by_id(id).await;
    }

    pub async fn invalidate_with_details(&self, id: Uuid) {
        self.invalidate(CacheKey::WithDetails(id)).await;
    }

    /// Clears the window ending today
    pub async fn invalidate_last_7_days(&self) {
        self.invalidate(CacheKey::Last7Days(Utc::now().date_naive()))
            .await;
    }

    pub async fn invalidate_with_services(&self, car_id: Uuid) {
        self.invalidate(CacheKey::WithServices(car_id)).await;
    }
}
