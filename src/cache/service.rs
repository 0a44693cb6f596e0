//! Cached Service Store
//!
//! Service writes also clear the owning car's "with-services" entry, which
//! lives in the car namespace.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{Entity, ScheduledService, Service};
use crate::store::{AggregateStore, ServiceStore, StoreResult};

use super::{CacheKey, EntityCache};

/// Cache-aside decorator over a [`ServiceStore`]
#[derive(Debug, Clone)]
pub struct CachedServiceStore<S> {
    inner: S,
    cache: EntityCache,
    car_cache: EntityCache,
}

impl<S: ServiceStore> CachedServiceStore<S> {
    pub fn new(inner: S, cache: EntityCache, car_cache: EntityCache) -> Self {
        Self {
            inner,
            cache,
            car_cache,
        }
    }

    async fn invalidate(&self, service: &Service) {
        self.cache.invalidate_entity(service.id()).await;
        self.car_cache.invalidate_with_services(service.car_id).await;
    }
}

#[async_trait]
impl<S: ServiceStore> AggregateStore<Service> for CachedServiceStore<S> {
    async fn add(&self, entity: Service) -> StoreResult<Service> {
        let service = self.inner.add(entity).await?;
        self.invalidate(&service).await;
        Ok(service)
    }

    async fn get_active_by_id(&self, id: Uuid) -> StoreResult<Option<Service>> {
        self.cache
            .read_through_optional(CacheKey::ById(id), || self.inner.get_active_by_id(id))
            .await
    }

    async fn list_all_active(&self) -> StoreResult<Vec<Service>> {
        self.cache
            .read_through(CacheKey::AllActive, || self.inner.list_all_active())
            .await
    }

    async fn update_with_version(
        &self,
        entity: Service,
        expected_version: i64,
    ) -> StoreResult<Service> {
        // the car it was moved away from needs clearing too
        let previous = self.inner.get_active_by_id(entity.id()).await?;

        let service = self.inner.update_with_version(entity, expected_version).await?;
        self.invalidate(&service).await;
        if let Some(previous) = previous.filter(|p| p.car_id != service.car_id) {
            self.car_cache.invalidate_with_services(previous.car_id).await;
        }
        Ok(service)
    }

    async fn delete(&self, entity: &Service) -> StoreResult<Service> {
        let service = self.inner.delete(entity).await?;
        self.invalidate(&service).await;
        Ok(service)
    }
}

#[async_trait]
impl<S: ServiceStore> ServiceStore for CachedServiceStore<S> {
    async fn find_active_by_car_and_date(
        &self,
        car_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Vec<Service>> {
        self.cache
            .read_through(CacheKey::ByCarAndDate { car_id, date }, || {
                self.inner.find_active_by_car_and_date(car_id, date)
            })
            .await
    }

    async fn list_scheduled(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<ScheduledService>> {
        self.cache
            .read_through(CacheKey::Scheduled { from, to }, || {
                self.inner.list_scheduled(from, to)
            })
            .await
    }
}
