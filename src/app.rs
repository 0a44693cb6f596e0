//! Application wiring
//!
//! Builds the cached stores, the booking engine and the handlers over one
//! storage backend.

use std::sync::Arc;

use sqlx::PgPool;

use crate::booking::BookingEngine;
use crate::cache::{
    CacheBackend, CacheStats, CacheTtl, CachedCarStore, CachedCustomerStore, CachedRentalStore,
    CachedServiceStore, EntityCache, MemoryCache,
};
use crate::domain::{Car, Customer, Rental, Service};
use crate::handlers::{CarHandler, CustomerHandler, ServiceHandler};
use crate::store::{
    CarStore, CustomerStore, MemoryDatabase, PgStore, RentalStore, ServiceStore,
};

/// Everything a request-handling collaborator needs
#[derive(Clone)]
pub struct AppState {
    pub booking: BookingEngine,
    pub cars: CarHandler,
    pub customers: CustomerHandler,
    pub services: ServiceHandler,
    cache: Arc<MemoryCache>,
}

impl AppState {
    /// PostgreSQL-backed state
    pub fn postgres(pool: PgPool, cache: Arc<MemoryCache>, ttl: CacheTtl) -> Self {
        Self::assemble(
            PgStore::<Car>::new(pool.clone()),
            PgStore::<Customer>::new(pool.clone()),
            PgStore::<Rental>::new(pool.clone()),
            PgStore::<Service>::new(pool),
            cache,
            ttl,
        )
    }

    /// State over process-local tables
    pub fn in_memory(db: &MemoryDatabase, cache: Arc<MemoryCache>, ttl: CacheTtl) -> Self {
        Self::assemble(
            db.store::<Car>(),
            db.store::<Customer>(),
            db.store::<Rental>(),
            db.store::<Service>(),
            cache,
            ttl,
        )
    }

    fn assemble<C, U, R, S>(
        cars: C,
        customers: U,
        rentals: R,
        services: S,
        cache: Arc<MemoryCache>,
        ttl: CacheTtl,
    ) -> Self
    where
        C: CarStore + Clone + 'static,
        U: CustomerStore + 'static,
        R: RentalStore + 'static,
        S: ServiceStore + Clone + 'static,
    {
        let backend: Arc<dyn CacheBackend> = cache.clone();
        let car_cache = EntityCache::for_entity::<Car>(backend.clone(), ttl);

        let cached_cars: Arc<dyn CarStore> =
            Arc::new(CachedCarStore::new(cars.clone(), car_cache.clone()));
        let cached_customers: Arc<dyn CustomerStore> = Arc::new(CachedCustomerStore::new(
            customers,
            EntityCache::for_entity::<Customer>(backend.clone(), ttl),
        ));
        let cached_rentals: Arc<dyn RentalStore> = Arc::new(CachedRentalStore::new(
            rentals,
            EntityCache::for_entity::<Rental>(backend.clone(), ttl),
        ));
        let cached_services: Arc<dyn ServiceStore> = Arc::new(CachedServiceStore::new(
            services.clone(),
            EntityCache::for_entity::<Service>(backend, ttl),
            car_cache,
        ));

        Self {
            booking: BookingEngine::new(
                cached_cars.clone(),
                cached_customers.clone(),
                cached_rentals,
            ),
            cars: CarHandler::new(cached_cars.clone(), Arc::new(cars)),
            customers: CustomerHandler::new(cached_customers),
            services: ServiceHandler::new(cached_services, cached_cars, Arc::new(services)),
            cache,
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
