//! Cached Car Store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Car, Entity};
use crate::store::{AggregateStore, CarStore, StoreResult};

use super::{CacheKey, EntityCache};

/// Cache-aside decorator over a [`CarStore`]
#[derive(Debug, Clone)]
pub struct CachedCarStore<S> {
    inner: S,
    cache: EntityCache,
}

impl<S: CarStore> CachedCarStore<S> {
    pub fn new(inner: S, cache: EntityCache) -> Self {
        Self { inner, cache }
    }

    async fn invalidate(&self, id: Uuid) {
        self.cache.invalidate_entity(id).await;
        self.cache.invalidate_with_services(id).await;
    }
}

#[async_trait]
impl<S: CarStore> AggregateStore<Car> for CachedCarStore<S> {
    async fn add(&self, entity: Car) -> StoreResult<Car> {
        let car = self.inner.add(entity).await?;
        self.invalidate(car.id()).await;
        Ok(car)
    }

    async fn get_active_by_id(&self, id: Uuid) -> StoreResult<Option<Car>> {
        self.cache
            .read_through_optional(CacheKey::ById(id), || self.inner.get_active_by_id(id))
            .await
    }

    async fn list_all_active(&self) -> StoreResult<Vec<Car>> {
        self.cache
            .read_through(CacheKey::AllActive, || self.inner.list_all_active())
            .await
    }

    async fn update_with_version(&self, entity: Car, expected_version: i64) -> StoreResult<Car> {
        let car = self.inner.update_with_version(entity, expected_version).await?;
        self.invalidate(car.id()).await;
        Ok(car)
    }

    async fn delete(&self, entity: &Car) -> StoreResult<Car> {
        let car = self.inner.delete(entity).await?;
        self.invalidate(car.id()).await;
        Ok(car)
    }
}

#[async_trait]
impl<S: CarStore> CarStore for CachedCarStore<S> {
    async fn is_available(
        &self,
        car_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<bool> {
        self.inner.is_available(car_id, start, end).await
    }

    async fn find_by_model_and_type(&self, model: &str, car_type: &str) -> StoreResult<Vec<Car>> {
        let key = CacheKey::ByModelAndType {
            model: model.to_string(),
            car_type: car_type.to_string(),
        };
        self.cache
            .read_through(key, || self.inner.find_by_model_and_type(model, car_type))
            .await
    }

    async fn get_with_services(&self, id: Uuid) -> StoreResult<Option<Car>> {
        self.cache
            .read_through_optional(CacheKey::WithServices(id), || {
                self.inner.get_with_services(id)
            })
            .await
    }
}
