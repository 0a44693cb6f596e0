//! Rental Aggregate
//!
//! A booking of one car by one customer over an inclusive date range.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::car::Car;
use super::customer::Customer;
use super::entity::sealed::MetaAccess;
use super::entity::{Entity, EntityMeta};

/// Booking status, independent of the soft-delete flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RentalStatus {
    Active,
    Cancelled,
}

impl Default for RentalStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl RentalStatus {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RentalStatus::Active => "Active",
            RentalStatus::Cancelled => "Cancelled",
        }
    }

    /// Parse the storage representation
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Active" => Some(RentalStatus::Active),
            "Cancelled" => Some(RentalStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive-both-ends overlap test.
///
/// A range that starts on the instant another one ends is a conflict.
pub fn ranges_overlap(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    other_start: DateTime<Utc>,
    other_end: DateTime<Utc>,
) -> bool {
    start <= other_end && end >= other_start
}

/// Rental of a car by a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rental {
    meta: EntityMeta,

    pub customer_id: Uuid,

    pub car_id: Uuid,

    pub start: DateTime<Utc>,

    pub end: DateTime<Utc>,

    status: RentalStatus,

    /// Present iff `status == Cancelled`
    cancelled_at: Option<DateTime<Utc>>,
}

impl Rental {
    /// New active rental
    pub fn new(customer_id: Uuid, car_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            meta: EntityMeta::generate(),
            customer_id,
            car_id,
            start,
            end,
            status: RentalStatus::Active,
            cancelled_at: None,
        }
    }

    pub(crate) fn restore(
        meta: EntityMeta,
        customer_id: Uuid,
        car_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        status: RentalStatus,
        cancelled_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            meta,
            customer_id,
            car_id,
            start,
            end,
            status,
            cancelled_at,
        }
    }

    pub fn status(&self) -> RentalStatus {
        self.status
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == RentalStatus::Cancelled
    }

    /// Mark as cancelled. Leaves the active flag untouched.
    pub(crate) fn mark_cancelled(&mut self, at: DateTime<Utc>) {
        self.status = RentalStatus::Cancelled;
        self.cancelled_at = Some(at);
    }

    /// Copy status fields from another copy of the same rental
    pub(crate) fn copy_status_from(&mut self, other: &Rental) {
        self.status = other.status;
        self.cancelled_at = other.cancelled_at;
    }

    /// True if this rental prevents booking its car over `[start, end]`
    pub fn blocks(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.is_active()
            && self.status == RentalStatus::Active
            && ranges_overlap(start, end, self.start, self.end)
    }
}

impl Entity for Rental {
    const KIND: &'static str = "Rental";

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }
}

impl MetaAccess for Rental {
    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }
}

/// Rental joined with its car and customer.
///
/// Read model handed to the notification collaborator after a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalDetails {
    pub rental: Rental,
    pub car: Car,
    pub customer: Customer,
}
