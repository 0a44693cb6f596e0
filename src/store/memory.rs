//! In-Memory Aggregate Store
//!
//! Process-local tables shared by every store built from one
//! [`MemoryDatabase`]. Each operation holds the table lock for its whole
//! duration, so version checks and booking guards are atomic with their
//! writes.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::entity::sealed::MetaAccess;
use crate::domain::{
    Car, Customer, Entity, EntityMeta, Rental, RentalDetails, ScheduledService, Service,
};

use super::{
    AggregateStore, CarStore, CustomerStore, RentalStore, ServiceStore, StoreError, StoreResult,
};

/// Rows of every aggregate root, keyed by id
#[derive(Debug, Default)]
pub struct MemoryTables {
    cars: HashMap<Uuid, Car>,
    customers: HashMap<Uuid, Customer>,
    rentals: HashMap<Uuid, Rental>,
    services: HashMap<Uuid, Service>,
}

impl MemoryTables {
    fn car_is_active(&self, car_id: Uuid) -> bool {
        self.cars.get(&car_id).is_some_and(|car| car.is_active())
    }

    fn car_has_overlap(&self, car_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.rentals
            .values()
            .any(|rental| rental.car_id == car_id && rental.blocks(start, end))
    }

    fn guard_booking(&self, rental: &Rental) -> StoreResult<()> {
        if !self.car_is_active(rental.car_id) {
            return Err(StoreError::not_found::<Car>(rental.car_id));
        }
        if self.car_has_overlap(rental.car_id, rental.start, rental.end) {
            return Err(StoreError::BookingConflict {
                car_id: rental.car_id,
            });
        }
        Ok(())
    }
}

/// Table mapping for an aggregate root
pub trait MemoryRecord: Entity {
    fn table(tables: &MemoryTables) -> &HashMap<Uuid, Self>;

    fn table_mut(tables: &mut MemoryTables) -> &mut HashMap<Uuid, Self>;

    /// Adjust an entity before it is stored for the first time
    fn prepare_insert(&mut self) {}

    /// Carry over stored state an update must not overwrite
    fn carry_over(&mut self, _stored: &Self) {}

    /// Rows this entity points at must exist, active or not
    fn check_references(&self, _tables: &MemoryTables) -> StoreResult<()> {
        Ok(())
    }
}

impl MemoryRecord for Car {
    fn table(tables: &MemoryTables) -> &HashMap<Uuid, Self> {
        &tables.cars
    }

    fn table_mut(tables: &mut MemoryTables) -> &mut HashMap<Uuid, Self> {
        &mut tables.cars
    }

    fn prepare_insert(&mut self) {
        self.services.clear();
    }

    fn carry_over(&mut self, _stored: &Self) {
        self.services.clear();
    }
}

impl MemoryRecord for Customer {
    fn table(tables: &MemoryTables) -> &HashMap<Uuid, Self> {
        &tables.customers
    }

    fn table_mut(tables: &mut MemoryTables) -> &mut HashMap<Uuid, Self> {
        &mut tables.customers
    }
}

impl MemoryRecord for Rental {
    fn table(tables: &MemoryTables) -> &HashMap<Uuid, Self> {
        &tables.rentals
    }

    fn table_mut(tables: &mut MemoryTables) -> &mut HashMap<Uuid, Self> {
        &mut tables.rentals
    }

    fn prepare_insert(&mut self) {
        let fresh = Rental::new(self.customer_id, self.car_id, self.start, self.end);
        self.copy_status_from(&fresh);
    }

    fn carry_over(&mut self, stored: &Self) {
        self.copy_status_from(stored);
    }

    fn check_references(&self, tables: &MemoryTables) -> StoreResult<()> {
        if !tables.cars.contains_key(&self.car_id) {
            return Err(StoreError::not_found::<Car>(self.car_id));
        }
        if !tables.customers.contains_key(&self.customer_id) {
            return Err(StoreError::not_found::<Customer>(self.customer_id));
        }
        Ok(())
    }
}

impl MemoryRecord for Service {
    fn table(tables: &MemoryTables) -> &HashMap<Uuid, Self> {
        &tables.services
    }

    fn table_mut(tables: &mut MemoryTables) -> &mut HashMap<Uuid, Self> {
        &mut tables.services
    }

    fn check_references(&self, tables: &MemoryTables) -> StoreResult<()> {
        if !tables.cars.contains_key(&self.car_id) {
            return Err(StoreError::not_found::<Car>(self.car_id));
        }
        Ok(())
    }
}

fn insert_locked<T: MemoryRecord>(tables: &mut MemoryTables, mut entity: T) -> StoreResult<T> {
    if T::table(tables).contains_key(&entity.id()) {
        return Err(StoreError::duplicate_key::<T>(entity.id()));
    }
    entity.check_references(tables)?;

    entity.meta_mut().stamp_added();
    entity.prepare_insert();
    T::table_mut(tables).insert(entity.id(), entity.clone());
    Ok(entity)
}

fn update_locked<T: MemoryRecord>(
    tables: &mut MemoryTables,
    mut entity: T,
    expected_version: i64,
) -> StoreResult<T> {
    let id = entity.id();

    let stored = match T::table(tables).get(&id) {
        Some(stored) if stored.is_active() => stored,
        _ => return Err(StoreError::not_found::<T>(id)),
    };
    if stored.version() != expected_version {
        return Err(StoreError::conflict::<T>(
            id,
            expected_version,
            stored.version(),
        ));
    }
    entity.check_references(tables)?;

    entity.carry_over(stored);
    *entity.meta_mut() = EntityMeta::restore(id, true, expected_version + 1);
    T::table_mut(tables).insert(id, entity.clone());
    Ok(entity)
}

fn active_where<T, F>(table: &HashMap<Uuid, T>, predicate: F) -> Vec<T>
where
    T: Entity,
    F: Fn(&T) -> bool,
{
    table
        .values()
        .filter(|entity| entity.is_active() && predicate(entity))
        .cloned()
        .collect()
}

/// Shared in-process tables
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<RwLock<MemoryTables>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store for one aggregate root over these tables
    pub fn store<T: MemoryRecord>(&self) -> MemoryStore<T> {
        MemoryStore {
            db: self.clone(),
            _entity: PhantomData,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryTables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryTables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-memory store for one aggregate root
pub struct MemoryStore<T> {
    db: MemoryDatabase,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for MemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> std::fmt::Debug for MemoryStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").field("kind", &T::KIND).finish()
    }
}

#[async_trait]
impl<T: MemoryRecord> AggregateStore<T> for MemoryStore<T> {
    async fn add(&self, entity: T) -> StoreResult<T> {
        insert_locked(&mut self.db.write(), entity)
    }

    async fn get_active_by_id(&self, id: Uuid) -> StoreResult<Option<T>> {
        let tables = self.db.read();
        Ok(T::table(&tables)
            .get(&id)
            .filter(|entity| entity.is_active())
            .cloned())
    }

    async fn list_all_active(&self) -> StoreResult<Vec<T>> {
        let tables = self.db.read();
        Ok(active_where(T::table(&tables), |_| true))
    }

    async fn update_with_version(&self, entity: T, expected_version: i64) -> StoreResult<T> {
        update_locked(&mut self.db.write(), entity, expected_version)
    }

    async fn delete(&self, entity: &T) -> StoreResult<T> {
        let id = entity.id();
        let mut tables = self.db.write();

        let stored = T::table_mut(&mut tables)
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found::<T>(id))?;
        if !stored.is_active() {
            return Err(StoreError::already_deleted::<T>(id));
        }

        let version = stored.version() + 1;
        stored.meta_mut().mark_deleted(version);

        let mut deleted = entity.clone();
        deleted.meta_mut().mark_deleted(version);
        Ok(deleted)
    }
}

#[async_trait]
impl CarStore for MemoryStore<Car> {
    async fn is_available(
        &self,
        car_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<bool> {
        Ok(!self.db.read().car_has_overlap(car_id, start, end))
    }

    async fn find_by_model_and_type(&self, model: &str, car_type: &str) -> StoreResult<Vec<Car>> {
        let tables = self.db.read();
        Ok(active_where(&tables.cars, |car| car.matches(model, car_type)))
    }

    async fn get_with_services(&self, id: Uuid) -> StoreResult<Option<Car>> {
        let tables = self.db.read();
        let Some(car) = tables.cars.get(&id).filter(|car| car.is_active()) else {
            return Ok(None);
        };

        let mut car = car.clone();
        car.services = active_where(&tables.services, |service| service.car_id == id);
        car.services.sort_by_key(|service| service.date);
        Ok(Some(car))
    }
}

#[async_trait]
impl CustomerStore for MemoryStore<Customer> {
    async fn find_active_by_user_id(&self, user_id: &str) -> StoreResult<Vec<Customer>> {
        let tables = self.db.read();
        Ok(active_where(&tables.customers, |customer| {
            customer.user_id == user_id
        }))
    }
}

#[async_trait]
impl RentalStore for MemoryStore<Rental> {
    async fn cancel(&self, id: Uuid) -> StoreResult<Rental> {
        let mut tables = self.db.write();
        let rental = tables
            .rentals
            .get_mut(&id)
            .filter(|rental| rental.is_active())
            .ok_or_else(|| StoreError::not_found::<Rental>(id))?;

        rental.mark_cancelled(Utc::now());
        let version = rental.version() + 1;
        rental.meta_mut().set_version(version);
        Ok(rental.clone())
    }

    async fn get_with_details(&self, id: Uuid) -> StoreResult<Option<RentalDetails>> {
        let tables = self.db.read();
        let Some(rental) = tables.rentals.get(&id).filter(|rental| rental.is_active()) else {
            return Ok(None);
        };

        // inner join: no details without both sides
        let car = tables.cars.get(&rental.car_id);
        let customer = tables.customers.get(&rental.customer_id);
        Ok(car.zip(customer).map(|(car, customer)| RentalDetails {
            rental: rental.clone(),
            car: car.clone(),
            customer: customer.clone(),
        }))
    }

    async fn list_active_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Rental>> {
        let tables = self.db.read();
        let mut rentals = active_where(&tables.rentals, |rental| {
            !rental.is_cancelled() && rental.start >= from && rental.start <= to
        });
        rentals.sort_by_key(|rental| rental.start);
        Ok(rentals)
    }

    async fn list_by_customer(&self, customer_id: Uuid) -> StoreResult<Vec<Rental>> {
        let tables = self.db.read();
        let mut rentals = active_where(&tables.rentals, |rental| {
            rental.customer_id == customer_id
        });
        rentals.sort_by_key(|rental| rental.start);
        Ok(rentals)
    }

    async fn list_last_7_days(&self) -> StoreResult<Vec<Rental>> {
        let today = Utc::now().date_naive();
        let week_ago = today - Duration::days(6);

        let tables = self.db.read();
        let mut rentals = active_where(&tables.rentals, |rental| {
            let day = rental.start.date_naive();
            day >= week_ago && day <= today
        });
        rentals.sort_by_key(|rental| rental.start);
        Ok(rentals)
    }

    async fn book(&self, rental: Rental) -> StoreResult<Rental> {
        let mut tables = self.db.write();
        tables.guard_booking(&rental)?;
        insert_locked(&mut tables, rental)
    }

    async fn reschedule(&self, rental: Rental, expected_version: i64) -> StoreResult<Rental> {
        let mut tables = self.db.write();
        tables.guard_booking(&rental)?;
        update_locked(&mut tables, rental, expected_version)
    }
}

#[async_trait]
impl ServiceStore for MemoryStore<Service> {
    async fn find_active_by_car_and_date(
        &self,
        car_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Vec<Service>> {
        let tables = self.db.read();
        Ok(active_where(&tables.services, |service| {
            service.car_id == car_id && service.date == date
        }))
    }

    async fn list_scheduled(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<ScheduledService>> {
        let tables = self.db.read();
        let mut scheduled: Vec<ScheduledService> = tables
            .services
            .values()
            .filter(|service| service.is_active() && service.date >= from && service.date <= to)
            .filter_map(|service| {
                tables.cars.get(&service.car_id).map(|car| ScheduledService {
                    car_id: car.id(),
                    model: car.model.clone(),
                    car_type: car.car_type.clone(),
                    date: service.date,
                })
            })
            .collect();
        scheduled.sort_by_key(|service| service.date);
        Ok(scheduled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(n: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, n, 0, 0, 0).unwrap()
    }

    async fn seed(db: &MemoryDatabase) -> (Car, Customer) {
        let car = db.store::<Car>().add(Car::new("Corolla", "Sedan")).await.unwrap();
        let customer = db
            .store::<Customer>()
            .add(Customer::new("Ada", "1 Main St", "user-1"))
            .await
            .unwrap();
        (car, customer)
    }

    #[tokio::test]
    async fn test_add_stamps_active_version_one() {
        let db = MemoryDatabase::new();
        let cars = db.store::<Car>();

        let car = cars.add(Car::new("Corolla", "Sedan")).await.unwrap();

        assert_eq!(car.version(), 1);
        assert!(car.is_active());
        assert_eq!(cars.get_active_by_id(car.id()).await.unwrap(), Some(car));
    }

    #[test]
    fn test_store_futures_complete_without_a_runtime() {
        let db = MemoryDatabase::new();
        let customers = db.store::<Customer>();

        let customer = tokio_test::assert_ok!(tokio_test::block_on(
            customers.add(Customer::new("Ada Lovelace", "1 Main St", ""))
        ));
        tokio_test::assert_ok!(tokio_test::block_on(customers.delete(&customer)));
        tokio_test::assert_err!(tokio_test::block_on(customers.delete(&customer)));
    }

    #[tokio::test]
    async fn test_add_rejects_existing_id() {
        let db = MemoryDatabase::new();
        let cars = db.store::<Car>();
        let car = cars.add(Car::new("Corolla", "Sedan")).await.unwrap();

        let err = cars
            .add(Car::with_id(car.id(), "Civic", "Sedan"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));
    }

    #[tokio::test]
    async fn test_update_bumps_version_by_one() {
        let db = MemoryDatabase::new();
        let cars = db.store::<Car>();
        let mut car = cars.add(Car::new("Corolla", "Sedan")).await.unwrap();

        car.model = "Corolla Cross".to_string();
        let updated = cars.update(car).await.unwrap();

        assert_eq!(updated.version(), 2);
        let stored = cars.get_active_by_id(updated.id()).await.unwrap().unwrap();
        assert_eq!(stored.model, "Corolla Cross");
        assert_eq!(stored.version(), 2);
    }

    #[tokio::test]
    async fn test_stale_update_is_a_conflict_and_leaves_row_untouched() {
        let db = MemoryDatabase::new();
        let cars = db.store::<Car>();
        let car = cars.add(Car::new("Corolla", "Sedan")).await.unwrap();

        let mut first = car.clone();
        first.model = "First".to_string();
        let mut second = car.clone();
        second.model = "Second".to_string();

        cars.update(first).await.unwrap();
        let err = cars.update(second).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::ConcurrencyConflict {
                expected: 1,
                found: 2,
                ..
            }
        ));
        let stored = cars.get_active_by_id(car.id()).await.unwrap().unwrap();
        assert_eq!(stored.model, "First");
        assert_eq!(stored.version(), 2);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_row_and_bumps_version() {
        let db = MemoryDatabase::new();
        let cars = db.store::<Car>();
        let car = cars.add(Car::new("Corolla", "Sedan")).await.unwrap();

        let deleted = cars.delete(&car).await.unwrap();

        assert!(!deleted.is_active());
        assert_eq!(deleted.version(), 2);
        assert!(cars.get_active_by_id(car.id()).await.unwrap().is_none());
        assert!(cars.list_all_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_twice_and_delete_missing() {
        let db = MemoryDatabase::new();
        let cars = db.store::<Car>();
        let car = cars.add(Car::new("Corolla", "Sedan")).await.unwrap();
        cars.delete(&car).await.unwrap();

        let err = cars.delete(&car).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyDeleted { .. }));

        let err = cars.delete(&Car::new("Ghost", "Van")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_of_deleted_row_is_not_found() {
        let db = MemoryDatabase::new();
        let cars = db.store::<Car>();
        let car = cars.add(Car::new("Corolla", "Sedan")).await.unwrap();
        let deleted = cars.delete(&car).await.unwrap();

        let err = cars.update(deleted).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_rental_update_keeps_stored_status() {
        let db = MemoryDatabase::new();
        let (car, customer) = seed(&db).await;
        let rentals = db.store::<Rental>();
        let rental = rentals
            .add(Rental::new(customer.id(), car.id(), day(1), day(3)))
            .await
            .unwrap();

        let cancelled = rentals.cancel(rental.id()).await.unwrap();
        assert!(cancelled.is_cancelled());
        assert_eq!(cancelled.version(), 2);

        // stale copy still says Active
        let mut edited = rental.clone();
        edited.end = day(4);
        let updated = rentals.update_with_version(edited, 2).await.unwrap();

        assert!(updated.is_cancelled());
        assert_eq!(updated.end, day(4));
        assert_eq!(updated.version(), 3);
    }

    #[tokio::test]
    async fn test_cancel_ignores_version_and_can_repeat() {
        let db = MemoryDatabase::new();
        let (car, customer) = seed(&db).await;
        let rentals = db.store::<Rental>();
        let rental = rentals
            .add(Rental::new(customer.id(), car.id(), day(1), day(3)))
            .await
            .unwrap();

        rentals.cancel(rental.id()).await.unwrap();
        let again = rentals.cancel(rental.id()).await.unwrap();

        assert_eq!(again.version(), 3);
        assert!(again.cancelled_at().is_some());
        assert!(rentals.cancel(Uuid::new_v4()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_availability_ignores_cancelled_and_deleted_rentals() {
        let db = MemoryDatabase::new();
        let cars = db.store::<Car>();
        let rentals = db.store::<Rental>();
        let (car, customer) = seed(&db).await;

        let kept = rentals
            .add(Rental::new(customer.id(), car.id(), day(1), day(3)))
            .await
            .unwrap();
        assert!(!cars.is_available(car.id(), day(3), day(5)).await.unwrap());
        assert!(cars.is_available(car.id(), day(4), day(5)).await.unwrap());

        rentals.cancel(kept.id()).await.unwrap();
        assert!(cars.is_available(car.id(), day(1), day(3)).await.unwrap());

        let other = rentals
            .add(Rental::new(customer.id(), car.id(), day(10), day(12)))
            .await
            .unwrap();
        rentals.delete(&other).await.unwrap();
        assert!(cars.is_available(car.id(), day(10), day(12)).await.unwrap());
    }

    #[tokio::test]
    async fn test_book_rejects_overlap_and_missing_car() {
        let db = MemoryDatabase::new();
        let (car, customer) = seed(&db).await;
        let rentals = db.store::<Rental>();

        rentals
            .book(Rental::new(customer.id(), car.id(), day(1), day(3)))
            .await
            .unwrap();

        let err = rentals
            .book(Rental::new(customer.id(), car.id(), day(3), day(4)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::BookingConflict { .. }));

        let err = rentals
            .book(Rental::new(customer.id(), Uuid::new_v4(), day(1), day(2)))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_writes_require_referenced_rows() {
        let db = MemoryDatabase::new();
        let (car, customer) = seed(&db).await;
        let rentals = db.store::<Rental>();

        let err = rentals
            .add(Rental::new(Uuid::new_v4(), car.id(), day(1), day(2)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::EntityNotFound { kind: "Customer", .. }));

        let err = rentals
            .book(Rental::new(Uuid::new_v4(), car.id(), day(1), day(2)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::EntityNotFound { kind: "Customer", .. }));
        assert!(rentals.list_all_active().await.unwrap().is_empty());

        let mut rental = rentals
            .add(Rental::new(customer.id(), car.id(), day(1), day(2)))
            .await
            .unwrap();
        rental.car_id = Uuid::new_v4();
        let err = rentals.update(rental).await.unwrap_err();
        assert!(matches!(err, StoreError::EntityNotFound { kind: "Car", .. }));

        let err = db
            .store::<Service>()
            .add(Service::new(Uuid::new_v4(), NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::EntityNotFound { kind: "Car", .. }));

        // soft-deleted rows still satisfy the reference
        db.store::<Customer>().delete(&customer).await.unwrap();
        let kept = rentals
            .add(Rental::new(customer.id(), car.id(), day(5), day(6)))
            .await
            .unwrap();
        assert!(rentals.get_with_details(kept.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reschedule_does_not_exclude_itself() {
        let db = MemoryDatabase::new();
        let (car, customer) = seed(&db).await;
        let rentals = db.store::<Rental>();
        let mut rental = rentals
            .book(Rental::new(customer.id(), car.id(), day(1), day(3)))
            .await
            .unwrap();

        rental.end = day(4);
        let err = rentals.reschedule(rental.clone(), 1).await.unwrap_err();
        assert!(matches!(err, StoreError::BookingConflict { .. }));

        rental.start = day(10);
        rental.end = day(12);
        let moved = rentals.reschedule(rental, 1).await.unwrap();
        assert_eq!(moved.version(), 2);
    }

    #[tokio::test]
    async fn test_rental_queries() {
        let db = MemoryDatabase::new();
        let car = db.store::<Car>().add(Car::new("Corolla", "Sedan")).await.unwrap();
        let customer = db
            .store::<Customer>()
            .add(Customer::new("Ada", "1 Main St", "user-1"))
            .await
            .unwrap();
        let rentals = db.store::<Rental>();

        let first = rentals
            .add(Rental::new(customer.id(), car.id(), day(5), day(6)))
            .await
            .unwrap();
        let second = rentals
            .add(Rental::new(customer.id(), car.id(), day(8), day(9)))
            .await
            .unwrap();
        rentals.cancel(second.id()).await.unwrap();

        let between = rentals.list_active_between(day(1), day(10)).await.unwrap();
        assert_eq!(between.len(), 1);
        assert_eq!(between[0].id(), first.id());

        let history = rentals.list_by_customer(customer.id()).await.unwrap();
        assert_eq!(history.len(), 2);

        let details = rentals.get_with_details(first.id()).await.unwrap().unwrap();
        assert_eq!(details.car.id(), car.id());
        assert_eq!(details.customer.full_name, "Ada");
    }

    #[tokio::test]
    async fn test_last_7_days_window() {
        let db = MemoryDatabase::new();
        let (car, customer) = seed(&db).await;
        let rentals = db.store::<Rental>();
        let now = Utc::now();

        let recent = rentals
            .add(Rental::new(customer.id(), car.id(), now, now + Duration::days(2)))
            .await
            .unwrap();
        rentals
            .add(Rental::new(
                customer.id(),
                car.id(),
                now - Duration::days(10),
                now - Duration::days(9),
            ))
            .await
            .unwrap();

        let week = rentals.list_last_7_days().await.unwrap();
        assert_eq!(week.len(), 1);
        assert_eq!(week[0].id(), recent.id());
    }

    #[tokio::test]
    async fn test_car_with_services_and_schedule() {
        let db = MemoryDatabase::new();
        let cars = db.store::<Car>();
        let services = db.store::<Service>();
        let car = cars.add(Car::new("Corolla", "Sedan")).await.unwrap();
        let may_2 = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();
        let may_1 = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();

        services.add(Service::new(car.id(), may_2)).await.unwrap();
        let dropped = services.add(Service::new(car.id(), may_1)).await.unwrap();
        services.add(Service::new(car.id(), may_1)).await.unwrap();
        services.delete(&dropped).await.unwrap();

        let loaded = cars.get_with_services(car.id()).await.unwrap().unwrap();
        assert_eq!(loaded.services.len(), 2);
        assert_eq!(loaded.services[0].date, may_1);

        let on_day = services.find_active_by_car_and_date(car.id(), may_1).await.unwrap();
        assert_eq!(on_day.len(), 1);

        let scheduled = services.list_scheduled(may_1, may_2).await.unwrap();
        assert_eq!(scheduled.len(), 2);
        assert_eq!(scheduled[0].model, "Corolla");
    }
}
