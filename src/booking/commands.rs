//! Booking commands
//!
//! Requests the booking engine acts on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// Reject a range whose end is not strictly after its start
pub fn validate_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), DomainError> {
    if end <= start {
        return Err(DomainError::InvalidRange { start, end });
    }
    Ok(())
}

// =========================================================================
// CreateRentalCommand
// =========================================================================

/// Command to book a car for a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRentalCommand {
    pub customer_id: Uuid,
    pub car_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CreateRentalCommand {
    pub fn new(customer_id: Uuid, car_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            customer_id,
            car_id,
            start,
            end,
        }
    }
}

// =========================================================================
// ModifyRentalCommand
// =========================================================================

/// Command to move a rental to new dates and optionally another car
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifyRentalCommand {
    pub rental_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Target car; the rental's current car when omitted
    pub car_id: Option<Uuid>,
    /// Version the caller read; the currently stored one when omitted
    pub expected_version: Option<i64>,
}

impl ModifyRentalCommand {
    pub fn new(rental_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            rental_id,
            start,
            end,
            car_id: None,
            expected_version: None,
        }
    }

    pub fn with_car(mut self, car_id: Uuid) -> Self {
        self.car_id = Some(car_id);
        self
    }

    pub fn with_expected_version(mut self, version: i64) -> Self {
        self.expected_version = Some(version);
        self
    }
}

// =========================================================================
// AvailabilityQuery
// =========================================================================

/// Search for free cars of a model and category over a range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub model: String,
    pub car_type: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AvailabilityQuery {
    pub fn new(
        model: impl Into<String>,
        car_type: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            model: model.into(),
            car_type: car_type.into(),
            start,
            end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_validate_range_requires_end_after_start() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap();

        assert!(validate_range(start, end).is_ok());
        assert!(matches!(
            validate_range(start, start),
            Err(DomainError::InvalidRange { .. })
        ));
        assert!(validate_range(end, start).is_err());
    }

    #[test]
    fn test_modify_command_builders() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let car_id = Uuid::new_v4();
        let cmd = ModifyRentalCommand::new(Uuid::new_v4(), start, start)
            .with_car(car_id)
            .with_expected_version(3);

        assert_eq!(cmd.car_id, Some(car_id));
        assert_eq!(cmd.expected_version, Some(3));
    }
}
