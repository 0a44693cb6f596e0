//! Booking Engine
//!
//! Decides whether a car can be booked for a range and keeps that decision
//! consistent with the stored rentals. Overlap is inclusive on both ends.
//!
//! The early availability check gives callers a fast `NotAvailable`; the
//! write itself goes through [`RentalStore::book`] / [`RentalStore::reschedule`],
//! which repeat the check atomically with the insert or update, so two
//! concurrent bookings of the same car and range cannot both succeed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Car, DomainError, Entity, Rental, RentalDetails};
use crate::error::{AppError, AppResult};
use crate::store::{CarStore, CustomerStore, RentalStore, StoreError};

use super::commands::{validate_range, AvailabilityQuery, CreateRentalCommand, ModifyRentalCommand};

/// Rental lifecycle over the car, customer and rental stores
#[derive(Clone)]
pub struct BookingEngine {
    cars: Arc<dyn CarStore>,
    customers: Arc<dyn CustomerStore>,
    rentals: Arc<dyn RentalStore>,
}

impl BookingEngine {
    pub fn new(
        cars: Arc<dyn CarStore>,
        customers: Arc<dyn CustomerStore>,
        rentals: Arc<dyn RentalStore>,
    ) -> Self {
        Self {
            cars,
            customers,
            rentals,
        }
    }

    /// False iff an active, non-cancelled rental of the car overlaps `[start, end]`
    pub async fn is_available(
        &self,
        car_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<bool> {
        Ok(self.cars.is_available(car_id, start, end).await?)
    }

    /// Active cars of the requested model and category that are free over the range
    pub async fn available_cars(&self, query: AvailabilityQuery) -> AppResult<Vec<Car>> {
        validate_range(query.start, query.end)?;

        let candidates = self
            .cars
            .find_by_model_and_type(&query.model, &query.car_type)
            .await?;

        let mut available = Vec::with_capacity(candidates.len());
        for car in candidates {
            if self.cars.is_available(car.id(), query.start, query.end).await? {
                available.push(car);
            }
        }
        Ok(available)
    }

    /// Book a car for a customer
    pub async fn create_rental(&self, command: CreateRentalCommand) -> AppResult<Rental> {
        let CreateRentalCommand {
            customer_id,
            car_id,
            start,
            end,
        } = command;

        validate_range(start, end)?;
        self.customers.require_active(customer_id).await?;
        self.cars.require_active(car_id).await?;

        if !self.cars.is_available(car_id, start, end).await? {
            return Err(DomainError::not_available(car_id, start, end).into());
        }

        self.rentals
            .book(Rental::new(customer_id, car_id, start, end))
            .await
            .map_err(|e| booking_error(e, car_id, start, end))
    }

    /// Move a rental to new dates and optionally another car.
    ///
    /// The rental being modified is not excluded from the conflict scan.
    pub async fn modify_rental(&self, command: ModifyRentalCommand) -> AppResult<Rental> {
        let mut rental = self.rentals.require_active(command.rental_id).await?;
        let car_id = command.car_id.unwrap_or(rental.car_id);
        let (start, end) = (command.start, command.end);

        validate_range(start, end)?;
        if command.car_id.is_some() {
            self.cars.require_active(car_id).await?;
        }

        if !self.cars.is_available(car_id, start, end).await? {
            return Err(DomainError::not_available(car_id, start, end).into());
        }

        let expected_version = command.expected_version.unwrap_or(rental.version());
        rental.car_id = car_id;
        rental.start = start;
        rental.end = end;

        self.rentals
            .reschedule(rental, expected_version)
            .await
            .map_err(|e| booking_error(e, car_id, start, end))
    }

    /// Cancel a rental. Never raises a version conflict.
    pub async fn cancel_rental(&self, rental_id: Uuid) -> AppResult<Rental> {
        Ok(self.rentals.cancel(rental_id).await?)
    }

    pub async fn get_rental(&self, rental_id: Uuid) -> AppResult<Rental> {
        Ok(self.rentals.require_active(rental_id).await?)
    }

    /// Rental with its car and customer, as read by the notification collaborator
    pub async fn rental_details(&self, rental_id: Uuid) -> AppResult<RentalDetails> {
        self.rentals
            .get_with_details(rental_id)
            .await?
            .ok_or_else(|| StoreError::not_found::<Rental>(rental_id).into())
    }

    pub async fn rentals_for_customer(&self, customer_id: Uuid) -> AppResult<Vec<Rental>> {
        Ok(self.rentals.list_by_customer(customer_id).await?)
    }
}

/// A guarded write that lost the race reports the same failure as the early check
fn booking_error(e: StoreError, car_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> AppError {
    match e {
        StoreError::BookingConflict { .. } => DomainError::not_available(car_id, start, end).into(),
        other => other.into(),
    }
}
