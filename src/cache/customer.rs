//! Cached Customer Store

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Customer, Entity};
use crate::store::{AggregateStore, CustomerStore, StoreResult};

use super::{CacheKey, EntityCache};

/// Cache-aside decorator over a [`CustomerStore`]
#[derive(Debug, Clone)]
pub struct CachedCustomerStore<S> {
    inner: S,
    cache: EntityCache,
}

impl<S: CustomerStore> CachedCustomerStore<S> {
    pub fn new(inner: S, cache: EntityCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<S: CustomerStore> AggregateStore<Customer> for CachedCustomerStore<S> {
    async fn add(&self, entity: Customer) -> StoreResult<Customer> {
        let customer = self.inner.add(entity).await?;
        self.cache.invalidate_entity(customer.id()).await;
        Ok(customer)
    }

    async fn get_active_by_id(&self, id: Uuid) -> StoreResult<Option<Customer>> {
        self.cache
            .read_through_optional(CacheKey::ById(id), || self.inner.get_active_by_id(id))
            .await
    }

    async fn list_all_active(&self) -> StoreResult<Vec<Customer>> {
        self.cache
            .read_through(CacheKey::AllActive, || self.inner.list_all_active())
            .await
    }

    async fn update_with_version(
        &self,
        entity: Customer,
        expected_version: i64,
    ) -> StoreResult<Customer> {
        let customer = self.inner.update_with_version(entity, expected_version).await?;
        self.cache.invalidate_entity(customer.id()).await;
        Ok(customer)
    }

    async fn delete(&self, entity: &Customer) -> StoreResult<Customer> {
        let customer = self.inner.delete(entity).await?;
        self.cache.invalidate_entity(customer.id()).await;
        Ok(customer)
    }
}

#[async_trait]
impl<S: CustomerStore> CustomerStore for CachedCustomerStore<S> {
    async fn find_active_by_user_id(&self, user_id: &str) -> StoreResult<Vec<Customer>> {
        self.cache
            .read_through(CacheKey::ByUser(user_id.to_string()), || {
                self.inner.find_active_by_user_id(user_id)
            })
            .await
    }
}
