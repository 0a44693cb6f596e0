//! Aggregate Store module
//!
//! Soft-delete and optimistic-concurrency persistence shared by every
//! aggregate root. One implementation per storage technology:
//! [`PgStore`] for PostgreSQL and [`MemoryStore`] for in-process use.

mod error;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{Car, Customer, Entity, Rental, RentalDetails, ScheduledService, Service};

pub use error::StoreError;
pub use memory::{MemoryDatabase, MemoryStore};
pub use postgres::PgStore;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Uniform add/read/update/soft-delete contract for an aggregate root.
///
/// Version checks are atomic with the write they guard. Conflicts are
/// reported, never resolved or retried here.
#[async_trait]
pub trait AggregateStore<T: Entity>: Send + Sync {
    /// Persist a new entity as active at version 1
    async fn add(&self, entity: T) -> StoreResult<T>;

    /// Entity by id if it exists and is active
    async fn get_active_by_id(&self, id: Uuid) -> StoreResult<Option<T>>;

    /// All active entities, in no particular order
    async fn list_all_active(&self) -> StoreResult<Vec<T>>;

    /// Persist the entity's fields if the stored version equals
    /// `expected_version`; the stored version becomes `expected_version + 1`.
    async fn update_with_version(&self, entity: T, expected_version: i64) -> StoreResult<T>;

    /// Soft delete: mark inactive and bump the version
    async fn delete(&self, entity: &T) -> StoreResult<T>;

    /// Update using the version the caller's copy was read at
    async fn update(&self, entity: T) -> StoreResult<T> {
        let expected = entity.version();
        self.update_with_version(entity, expected).await
    }

    /// Like [`get_active_by_id`](Self::get_active_by_id), absent becomes `EntityNotFound`
    async fn require_active(&self, id: Uuid) -> StoreResult<T> {
        self.get_active_by_id(id)
            .await?
            .ok_or_else(|| StoreError::not_found::<T>(id))
    }
}

/// Car persistence
#[async_trait]
pub trait CarStore: AggregateStore<Car> {
    /// False iff an active, non-cancelled rental of the car overlaps `[start, end]`
    async fn is_available(
        &self,
        car_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Active cars of a model and category
    async fn find_by_model_and_type(&self, model: &str, car_type: &str) -> StoreResult<Vec<Car>>;

    /// Active car with its active services attached
    async fn get_with_services(&self, id: Uuid) -> StoreResult<Option<Car>>;
}

/// Customer persistence
#[async_trait]
pub trait CustomerStore: AggregateStore<Customer> {
    /// Active customers linked to an external identity
    async fn find_active_by_user_id(&self, user_id: &str) -> StoreResult<Vec<Customer>>;
}

/// Rental persistence
#[async_trait]
pub trait RentalStore: AggregateStore<Rental> {
    /// Set status to cancelled with the current time.
    ///
    /// Does not check the version; bumps it like any other write.
    async fn cancel(&self, id: Uuid) -> StoreResult<Rental>;

    /// Active rental joined with its car and customer
    async fn get_with_details(&self, id: Uuid) -> StoreResult<Option<RentalDetails>>;

    /// Active-status rentals starting within `[from, to]`
    async fn list_active_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Rental>>;

    /// Rentals of a customer, cancelled ones included
    async fn list_by_customer(&self, customer_id: Uuid) -> StoreResult<Vec<Rental>>;

    /// Rentals starting in the last seven UTC days, today included
    async fn list_last_7_days(&self) -> StoreResult<Vec<Rental>>;

    /// Add a rental if no active rental of its car overlaps it.
    ///
    /// The overlap check and the insert are atomic. Fails with
    /// `BookingConflict` on overlap and `EntityNotFound` if the car is
    /// absent or inactive.
    async fn book(&self, rental: Rental) -> StoreResult<Rental>;

    /// Versioned update of a rental, atomic with the same overlap check as
    /// [`book`](Self::book). The rental itself is not excluded from the scan.
    async fn reschedule(&self, rental: Rental, expected_version: i64) -> StoreResult<Rental>;
}

/// Service persistence
#[async_trait]
pub trait ServiceStore: AggregateStore<Service> {
    /// Active services of a car on a date
    async fn find_active_by_car_and_date(
        &self,
        car_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Vec<Service>>;

    /// Active services within `[from, to]` joined with their car, by date
    async fn list_scheduled(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<ScheduledService>>;
}
