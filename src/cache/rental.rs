//! Cached Rental Store
//!
//! Rental writes clear "with-details" and the last-7-days window on top of
//! the usual "all-active" and "by-id". Date-range and per-customer lists
//! only expire on their TTL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Entity, Rental, RentalDetails};
use crate::store::{AggregateStore, RentalStore, StoreResult};

use super::{CacheKey, EntityCache};

/// Cache-aside decorator over a [`RentalStore`]
#[derive(Debug, Clone)]
pub struct CachedRentalStore<S> {
    inner: S,
    cache: EntityCache,
}

impl<S: RentalStore> CachedRentalStore<S> {
    pub fn new(inner: S, cache: EntityCache) -> Self {
        Self { inner, cache }
    }

    async fn invalidate(&self, id: Uuid) {
        self.cache.invalidate_entity(id).await;
        self.cache.invalidate_with_details(id).await;
        self.cache.invalidate_last_7_days().await;
    }
}

#[async_trait]
impl<S: RentalStore> AggregateStore<Rental> for CachedRentalStore<S> {
    async fn add(&self, entity: Rental) -> StoreResult<Rental> {
        let rental = self.inner.add(entity).await?;
        self.invalidate(rental.id()).await;
        Ok(rental)
    }

    async fn get_active_by_id(&self, id: Uuid) -> StoreResult<Option<Rental>> {
        self.cache
            .read_through_optional(CacheKey::ById(id), || self.inner.get_active_by_id(id))
            .await
    }

    async fn list_all_active(&self) -> StoreResult<Vec<Rental>> {
        self.cache
            .read_through(CacheKey::AllActive, || self.inner.list_all_active())
            .await
    }

    async fn update_with_version(
        &self,
        entity: Rental,
        expected_version: i64,
    ) -> StoreResult<Rental> {
        let rental = self.inner.update_with_version(entity, expected_version).await?;
        self.invalidate(rental.id()).await;
        Ok(rental)
    }

    async fn delete(&self, entity: &Rental) -> StoreResult<Rental> {
        let rental = self.inner.delete(entity).await?;
        self.invalidate(rental.id()).await;
        Ok(rental)
    }
}

#[async_trait]
impl<S: RentalStore> RentalStore for CachedRentalStore<S> {
    async fn cancel(&self, id: Uuid) -> StoreResult<Rental> {
        let rental = self.inner.cancel(id).await?;
        self.invalidate(id).await;
        Ok(rental)
    }

    async fn get_with_details(&self, id: Uuid) -> StoreResult<Option<RentalDetails>> {
        self.cache
            .read_through_optional(CacheKey::WithDetails(id), || {
                self.inner.get_with_details(id)
            })
            .await
    }

    async fn list_active_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Rental>> {
        self.cache
            .read_through(CacheKey::BetweenDates { from, to }, || {
                self.inner.list_active_between(from, to)
            })
            .await
    }

    async fn list_by_customer(&self, customer_id: Uuid) -> StoreResult<Vec<Rental>> {
        self.cache
            .read_through(CacheKey::ByCustomer(customer_id), || {
                self.inner.list_by_customer(customer_id)
            })
            .await
    }

    async fn list_last_7_days(&self) -> StoreResult<Vec<Rental>> {
        let today = Utc::now().date_naive();
        self.cache
            .read_through(CacheKey::Last7Days(today), || self.inner.list_last_7_days())
            .await
    }

    async fn book(&self, rental: Rental) -> StoreResult<Rental> {
        let rental = self.inner.book(rental).await?;
        self.invalidate(rental.id()).await;
        Ok(rental)
    }

    async fn reschedule(&self, rental: Rental, expected_version: i64) -> StoreResult<Rental> {
        let rental = self.inner.reschedule(rental, expected_version).await?;
        self.invalidate(rental.id()).await;
        Ok(rental)
    }
}
