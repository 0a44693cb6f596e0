//! PostgreSQL Aggregate Store
//!
//! One table per aggregate root. Every table carries `id`, `is_active` and
//! `version`; the remaining columns are described by [`PgRecord`].

use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgConnection, PgPool, Postgres, Row};
use uuid::Uuid;

use crate::domain::entity::sealed::MetaAccess;
use crate::domain::{
    Car, Customer, Entity, EntityMeta, Rental, RentalDetails, RentalStatus, ScheduledService,
    Service, INITIAL_VERSION,
};

use super::{
    AggregateStore, CarStore, CustomerStore, RentalStore, ServiceStore, StoreError, StoreResult,
};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// Table mapping for an aggregate root
pub trait PgRecord: Entity + Unpin {
    /// Table name
    const TABLE: &'static str;

    /// Entity columns, in the order [`bind_fields`](Self::bind_fields) binds them
    const FIELDS: &'static [&'static str];

    /// Decode a row selected with `SELECT *`
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error>;

    /// Bind the entity columns onto a query
    fn bind_fields<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q>;

    /// Referenced row behind a violated foreign key constraint
    fn missing_reference(&self, _constraint: &str) -> Option<StoreError> {
        None
    }
}

fn read_meta(row: &PgRow) -> Result<EntityMeta, sqlx::Error> {
    Ok(EntityMeta::restore(
        row.try_get("id")?,
        row.try_get("is_active")?,
        row.try_get("version")?,
    ))
}

impl PgRecord for Car {
    const TABLE: &'static str = "cars";
    const FIELDS: &'static [&'static str] = &["model", "car_type"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Car::restore(
            read_meta(row)?,
            row.try_get("model")?,
            row.try_get("car_type")?,
        ))
    }

    fn bind_fields<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query.bind(&self.model).bind(&self.car_type)
    }
}

impl PgRecord for Customer {
    const TABLE: &'static str = "customers";
    const FIELDS: &'static [&'static str] = &["full_name", "address", "user_id"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Customer::restore(
            read_meta(row)?,
            row.try_get("full_name")?,
            row.try_get("address")?,
            row.try_get("user_id")?,
        ))
    }

    fn bind_fields<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(&self.full_name)
            .bind(&self.address)
            .bind(&self.user_id)
    }
}

impl PgRecord for Rental {
    const TABLE: &'static str = "rentals";
    // status and cancelled_at are only written by `cancel`
    const FIELDS: &'static [&'static str] = &["customer_id", "car_id", "start_date", "end_date"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status = RentalStatus::parse(&status)
            .ok_or_else(|| sqlx::Error::Decode(format!("unknown rental status '{status}'").into()))?;

        Ok(Rental::restore(
            read_meta(row)?,
            row.try_get("customer_id")?,
            row.try_get("car_id")?,
            row.try_get("start_date")?,
            row.try_get("end_date")?,
            status,
            row.try_get("cancelled_at")?,
        ))
    }

    fn bind_fields<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.customer_id)
            .bind(self.car_id)
            .bind(self.start)
            .bind(self.end)
    }

    fn missing_reference(&self, constraint: &str) -> Option<StoreError> {
        match constraint {
            "rentals_car_id_fkey" => Some(StoreError::not_found::<Car>(self.car_id)),
            "rentals_customer_id_fkey" => Some(StoreError::not_found::<Customer>(self.customer_id)),
            _ => None,
        }
    }
}

impl PgRecord for Service {
    const TABLE: &'static str = "services";
    const FIELDS: &'static [&'static str] = &["car_id", "scheduled_on"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Service::restore(
            read_meta(row)?,
            row.try_get("car_id")?,
            row.try_get("scheduled_on")?,
        ))
    }

    fn bind_fields<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query.bind(self.car_id).bind(self.date)
    }

    fn missing_reference(&self, constraint: &str) -> Option<StoreError> {
        (constraint == "services_car_id_fkey").then(|| StoreError::not_found::<Car>(self.car_id))
    }
}

// =========================================================================
// SQL builders
// =========================================================================

fn insert_sql<T: PgRecord>() -> String {
    let params: Vec<String> = (0..T::FIELDS.len()).map(|i| format!("${}", i + 2)).collect();
    format!(
        "INSERT INTO {} (id, is_active, version, {}) VALUES ($1, TRUE, {}, {}) \
         ON CONFLICT (id) DO NOTHING",
        T::TABLE,
        T::FIELDS.join(", "),
        INITIAL_VERSION,
        params.join(", ")
    )
}

fn update_sql<T: PgRecord>() -> String {
    let assignments: Vec<String> = T::FIELDS
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{column} = ${}", i + 3))
        .collect();
    format!(
        "UPDATE {} SET {}, version = version + 1 \
         WHERE id = $1 AND version = $2 AND is_active RETURNING version",
        T::TABLE,
        assignments.join(", ")
    )
}

/// Foreign key violations become `EntityNotFound` for the referenced row
fn write_error<T: PgRecord>(entity: &T, e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_foreign_key_violation() {
            if let Some(missing) = db.constraint().and_then(|c| entity.missing_reference(c)) {
                return missing;
            }
        }
    }
    StoreError::Database(e)
}

/// Rows that cannot be mapped back to an entity are `InvalidData`
fn read_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Decode(source) => StoreError::InvalidData(source.to_string()),
        sqlx::Error::ColumnDecode { index, source } => {
            StoreError::InvalidData(format!("column {index}: {source}"))
        }
        other => StoreError::Database(other),
    }
}

fn decode<T: PgRecord>(row: &PgRow) -> StoreResult<T> {
    T::from_row(row).map_err(read_error)
}

fn decode_all<T: PgRecord>(rows: Vec<PgRow>) -> StoreResult<Vec<T>> {
    rows.iter().map(decode::<T>).collect()
}

// =========================================================================
// Connection-level operations shared by pooled and transactional paths
// =========================================================================

async fn insert_on<T: PgRecord>(conn: &mut PgConnection, mut entity: T) -> StoreResult<T> {
    entity.meta_mut().stamp_added();
    let sql = insert_sql::<T>();

    let inserted = entity
        .bind_fields(sqlx::query(&sql).bind(entity.id()))
        .execute(&mut *conn)
        .await
        .map_err(|e| write_error(&entity, e))?
        .rows_affected();

    if inserted == 0 {
        return Err(StoreError::duplicate_key::<T>(entity.id()));
    }
    Ok(entity)
}

async fn update_on<T: PgRecord>(
    conn: &mut PgConnection,
    mut entity: T,
    expected_version: i64,
) -> StoreResult<T> {
    let id = entity.id();
    let sql = update_sql::<T>();

    let row = entity
        .bind_fields(sqlx::query(&sql).bind(id).bind(expected_version))
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| write_error(&entity, e))?;

    match row {
        Some(row) => {
            let version: i64 = row.try_get("version")?;
            *entity.meta_mut() = EntityMeta::restore(id, true, version);
            Ok(entity)
        }
        None => Err(classify_update_miss::<T>(conn, id, expected_version).await?),
    }
}

/// Work out why a conditional update matched no row
async fn classify_update_miss<T: PgRecord>(
    conn: &mut PgConnection,
    id: Uuid,
    expected_version: i64,
) -> StoreResult<StoreError> {
    let current: Option<(i64, bool)> = sqlx::query_as(&format!(
        "SELECT version, is_active FROM {} WHERE id = $1",
        T::TABLE
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(match current {
        Some((found, true)) => StoreError::conflict::<T>(id, expected_version, found),
        _ => StoreError::not_found::<T>(id),
    })
}

async fn car_has_overlap(
    conn: &mut PgConnection,
    car_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> StoreResult<bool> {
    let overlap: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM rentals
            WHERE car_id = $1
              AND is_active
              AND status = 'Active'
              AND $2 <= end_date
              AND $3 >= start_date
        )
        "#,
    )
    .bind(car_id)
    .bind(start)
    .bind(end)
    .fetch_one(&mut *conn)
    .await?;

    Ok(overlap)
}

/// Lock the car row for the rest of the transaction and check the range is free
async fn guard_booking(conn: &mut PgConnection, rental: &Rental) -> StoreResult<()> {
    let locked: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM cars WHERE id = $1 AND is_active FOR UPDATE")
            .bind(rental.car_id)
            .fetch_optional(&mut *conn)
            .await?;

    if locked.is_none() {
        return Err(StoreError::not_found::<Car>(rental.car_id));
    }

    if car_has_overlap(conn, rental.car_id, rental.start, rental.end).await? {
        return Err(StoreError::BookingConflict {
            car_id: rental.car_id,
        });
    }
    Ok(())
}

// =========================================================================
// PgStore
// =========================================================================

/// PostgreSQL-backed store for one aggregate root
pub struct PgStore<T> {
    pool: PgPool,
    _entity: PhantomData<fn() -> T>,
}

impl<T> PgStore<T> {
    /// Create a new store over a database pool
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl<T> Clone for PgStore<T> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

impl<T: Entity> std::fmt::Debug for PgStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore").field("kind", &T::KIND).finish()
    }
}

#[async_trait]
impl<T: PgRecord> AggregateStore<T> for PgStore<T> {
    async fn add(&self, entity: T) -> StoreResult<T> {
        let mut conn = self.pool.acquire().await?;
        insert_on(&mut conn, entity).await
    }

    async fn get_active_by_id(&self, id: Uuid) -> StoreResult<Option<T>> {
        let row = sqlx::query(&format!(
            "SELECT * FROM {} WHERE id = $1 AND is_active",
            T::TABLE
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(decode::<T>).transpose()
    }

    async fn list_all_active(&self) -> StoreResult<Vec<T>> {
        let rows = sqlx::query(&format!("SELECT * FROM {} WHERE is_active", T::TABLE))
            .fetch_all(&self.pool)
            .await?;

        decode_all(rows)
    }

    async fn update_with_version(&self, entity: T, expected_version: i64) -> StoreResult<T> {
        let mut conn = self.pool.acquire().await?;
        update_on(&mut conn, entity, expected_version).await
    }

    async fn delete(&self, entity: &T) -> StoreResult<T> {
        let id = entity.id();

        let version: Option<i64> = sqlx::query_scalar(&format!(
            "UPDATE {} SET is_active = FALSE, version = version + 1 \
             WHERE id = $1 AND is_active RETURNING version",
            T::TABLE
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(version) = version {
            let mut deleted = entity.clone();
            deleted.meta_mut().mark_deleted(version);
            return Ok(deleted);
        }

        let exists: Option<bool> =
            sqlx::query_scalar(&format!("SELECT is_active FROM {} WHERE id = $1", T::TABLE))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Err(match exists {
            Some(_) => StoreError::already_deleted::<T>(id),
            None => StoreError::not_found::<T>(id),
        })
    }
}

#[async_trait]
impl CarStore for PgStore<Car> {
    async fn is_available(
        &self,
        car_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut conn = self.pool.acquire().await?;
        Ok(!car_has_overlap(&mut conn, car_id, start, end).await?)
    }

    async fn find_by_model_and_type(&self, model: &str, car_type: &str) -> StoreResult<Vec<Car>> {
        let rows =
            sqlx::query("SELECT * FROM cars WHERE model = $1 AND car_type = $2 AND is_active")
                .bind(model)
                .bind(car_type)
                .fetch_all(&self.pool)
                .await?;

        decode_all(rows)
    }

    async fn get_with_services(&self, id: Uuid) -> StoreResult<Option<Car>> {
        let Some(mut car) = self.get_active_by_id(id).await? else {
            return Ok(None);
        };

        let rows = sqlx::query(
            "SELECT * FROM services WHERE car_id = $1 AND is_active ORDER BY scheduled_on",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        car.services = decode_all(rows)?;
        Ok(Some(car))
    }
}

#[async_trait]
impl CustomerStore for PgStore<Customer> {
    async fn find_active_by_user_id(&self, user_id: &str) -> StoreResult<Vec<Customer>> {
        let rows = sqlx::query("SELECT * FROM customers WHERE user_id = $1 AND is_active")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        decode_all(rows)
    }
}

#[async_trait]
impl RentalStore for PgStore<Rental> {
    async fn cancel(&self, id: Uuid) -> StoreResult<Rental> {
        let row = sqlx::query(
            r#"
            UPDATE rentals
            SET status = 'Cancelled', cancelled_at = $2, version = version + 1
            WHERE id = $1 AND is_active
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => decode::<Rental>(&row),
            None => Err(StoreError::not_found::<Rental>(id)),
        }
    }

    async fn get_with_details(&self, id: Uuid) -> StoreResult<Option<RentalDetails>> {
        let row = sqlx::query(
            r#"
            SELECT r.id, r.is_active, r.version, r.customer_id, r.car_id,
                   r.start_date, r.end_date, r.status, r.cancelled_at,
                   c.is_active AS car_is_active, c.version AS car_version,
                   c.model, c.car_type,
                   cu.is_active AS customer_is_active, cu.version AS customer_version,
                   cu.full_name, cu.address, cu.user_id
            FROM rentals r
            JOIN cars c ON c.id = r.car_id
            JOIN customers cu ON cu.id = r.customer_id
            WHERE r.id = $1 AND r.is_active
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let rental = decode::<Rental>(&row)?;
        let car = Car::restore(
            EntityMeta::restore(
                rental.car_id,
                row.try_get("car_is_active")?,
                row.try_get("car_version")?,
            ),
            row.try_get("model")?,
            row.try_get("car_type")?,
        );
        let customer = Customer::restore(
            EntityMeta::restore(
                rental.customer_id,
                row.try_get("customer_is_active")?,
                row.try_get("customer_version")?,
            ),
            row.try_get("full_name")?,
            row.try_get("address")?,
            row.try_get("user_id")?,
        );

        Ok(Some(RentalDetails {
            rental,
            car,
            customer,
        }))
    }

    async fn list_active_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Rental>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM rentals
            WHERE start_date >= $1 AND start_date <= $2
              AND status = 'Active' AND is_active
            ORDER BY start_date
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        decode_all(rows)
    }

    async fn list_by_customer(&self, customer_id: Uuid) -> StoreResult<Vec<Rental>> {
        let rows = sqlx::query(
            "SELECT * FROM rentals WHERE customer_id = $1 AND is_active ORDER BY start_date",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        decode_all(rows)
    }

    async fn list_last_7_days(&self) -> StoreResult<Vec<Rental>> {
        let today = Utc::now().date_naive();
        let week_ago = today - Duration::days(6);

        let rows = sqlx::query(
            r#"
            SELECT * FROM rentals
            WHERE (start_date AT TIME ZONE 'UTC')::date BETWEEN $1 AND $2
              AND is_active
            ORDER BY start_date
            "#,
        )
        .bind(week_ago)
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        decode_all(rows)
    }

    async fn book(&self, rental: Rental) -> StoreResult<Rental> {
        let mut tx = self.pool.begin().await?;

        guard_booking(&mut tx, &rental).await?;
        let booked = insert_on(&mut tx, rental).await?;

        tx.commit().await?;
        Ok(booked)
    }

    async fn reschedule(&self, rental: Rental, expected_version: i64) -> StoreResult<Rental> {
        let mut tx = self.pool.begin().await?;

        guard_booking(&mut tx, &rental).await?;
        let updated = update_on(&mut tx, rental, expected_version).await?;

        tx.commit().await?;
        Ok(updated)
    }
}

#[async_trait]
impl ServiceStore for PgStore<Service> {
    async fn find_active_by_car_and_date(
        &self,
        car_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Vec<Service>> {
        let rows = sqlx::query(
            "SELECT * FROM services WHERE car_id = $1 AND scheduled_on = $2 AND is_active",
        )
        .bind(car_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        decode_all(rows)
    }

    async fn list_scheduled(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<ScheduledService>> {
        let rows: Vec<(Uuid, String, String, NaiveDate)> = sqlx::query_as(
            r#"
            SELECT s.car_id, c.model, c.car_type, s.scheduled_on
            FROM services s
            JOIN cars c ON c.id = s.car_id
            WHERE s.is_active AND s.scheduled_on BETWEEN $1 AND $2
            ORDER BY s.scheduled_on
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(car_id, model, car_type, date)| ScheduledService {
                car_id,
                model,
                car_type,
                date,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_sql_binds_entity_columns_after_id() {
        let sql = insert_sql::<Rental>();
        assert!(sql.starts_with(
            "INSERT INTO rentals (id, is_active, version, customer_id, car_id, start_date, end_date)"
        ));
        assert!(sql.contains("VALUES ($1, TRUE, 1, $2, $3, $4, $5)"));
    }

    #[test]
    fn test_update_sql_is_conditional_on_version_and_active() {
        let sql = update_sql::<Car>();
        assert!(sql.contains("SET model = $3, car_type = $4, version = version + 1"));
        assert!(sql.contains("WHERE id = $1 AND version = $2 AND is_active"));
        assert!(!sql.contains("is_active ="));
    }

    #[test]
    fn test_rental_update_never_touches_status() {
        let sql = update_sql::<Rental>();
        assert!(!sql.contains("status"));
        assert!(!sql.contains("cancelled_at"));
    }

    #[test]
    fn test_decode_failures_are_invalid_data() {
        let err = read_error(sqlx::Error::Decode("unknown rental status 'Paused'".into()));
        match err {
            StoreError::InvalidData(msg) => assert!(msg.contains("Paused")),
            e => panic!("Expected InvalidData, got: {:?}", e),
        }

        assert!(matches!(read_error(sqlx::Error::RowNotFound), StoreError::Database(_)));
    }

    #[test]
    fn test_foreign_keys_name_the_missing_row() {
        let rental = Rental::new(Uuid::new_v4(), Uuid::new_v4(), Utc::now(), Utc::now());

        match rental.missing_reference("rentals_customer_id_fkey") {
            Some(StoreError::EntityNotFound { kind, id }) => {
                assert_eq!(kind, "Customer");
                assert_eq!(id, rental.customer_id);
            }
            other => panic!("Expected EntityNotFound, got: {:?}", other),
        }
        assert!(rental.missing_reference("rentals_pkey").is_none());

        let service = Service::new(Uuid::new_v4(), Utc::now().date_naive());
        assert!(service.missing_reference("services_car_id_fkey").is_some());
        assert!(Car::new("Corolla", "Sedan").missing_reference("any").is_none());
    }
}
