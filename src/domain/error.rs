//! Domain Error Types
//!
//! Business rule violations that don't depend on infrastructure.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Domain-specific errors
///
/// Storage outcomes (not found, version conflicts) live in
/// [`crate::store::StoreError`]; these are the rules the booking flow and the
/// fleet handlers enforce on top of the store.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Date range overlaps an active booking for the car
    #[error("Car {car_id} is not available from {start} to {end}")]
    NotAvailable {
        car_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// End is not strictly after start
    #[error("Invalid range: end {end} must be after start {start}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// An active entity with the same natural key already exists
    #[error("Duplicate {kind}: {key}")]
    DuplicateEntity { kind: &'static str, key: String },

    /// More than one active row found where at most one is allowed
    #[error("Data inconsistency: {0}")]
    DataInconsistency(String),
}

impl DomainError {
    pub fn not_available(car_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::NotAvailable { car_id, start, end }
    }

    pub fn duplicate(kind: &'static str, key: impl Into<String>) -> Self {
        Self::DuplicateEntity {
            kind,
            key: key.into(),
        }
    }

    /// Check if this is a client error (caller can fix the request)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRange { .. })
    }

    /// Check if this is a conflict with existing state
    pub fn is_conflict_error(&self) -> bool {
        matches!(
            self,
            Self::NotAvailable { .. } | Self::DuplicateEntity { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_not_available_error() {
        let start = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 1, 4, 0, 0, 0).unwrap();
        let err = DomainError::not_available(Uuid::nil(), start, end);

        assert!(err.is_conflict_error());
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("2025-01-02"));
    }

    #[test]
    fn test_invalid_range_error() {
        let start = Utc.with_ymd_and_hms(2025, 1, 4, 0, 0, 0).unwrap();
        let err = DomainError::InvalidRange { start, end: start };

        assert!(err.is_client_error());
        assert!(!err.is_conflict_error());
    }

    #[test]
    fn test_duplicate_and_inconsistency() {
        let dup = DomainError::duplicate("Car", "Corolla/Sedan");
        assert!(dup.is_conflict_error());
        assert_eq!(dup.to_string(), "Duplicate Car: Corolla/Sedan");

        let broken = DomainError::DataInconsistency("two active cars".to_string());
        assert!(!broken.is_conflict_error());
        assert!(!broken.is_client_error());
    }
}
