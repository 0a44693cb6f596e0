//! Store Errors
//!
//! Error types for aggregate store operations.

use uuid::Uuid;

use crate::domain::Entity;

/// Errors that can occur in an aggregate store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Row is absent or soft-deleted
    #[error("{kind} with ID '{id}' was not found or is inactive")]
    EntityNotFound { kind: &'static str, id: Uuid },

    /// Add of an id that is already stored
    #[error("{kind} with ID '{id}' already exists")]
    DuplicateKey { kind: &'static str, id: Uuid },

    /// Soft delete of a row that is already inactive
    #[error("{kind} with ID '{id}' is already deleted")]
    AlreadyDeleted { kind: &'static str, id: Uuid },

    /// Optimistic concurrency conflict
    #[error("Concurrency conflict for {kind} {id}: expected version {expected}, found {found}")]
    ConcurrencyConflict {
        kind: &'static str,
        id: Uuid,
        expected: i64,
        found: i64,
    },

    /// Guarded booking write found an overlapping active rental
    #[error("Booking conflict for car {car_id}")]
    BookingConflict { car_id: Uuid },

    /// Stored row could not be decoded
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found<T: Entity>(id: Uuid) -> Self {
        Self::EntityNotFound {
            kind: T::KIND,
            id,
        }
    }

    pub fn duplicate_key<T: Entity>(id: Uuid) -> Self {
        Self::DuplicateKey {
            kind: T::KIND,
            id,
        }
    }

    pub fn already_deleted<T: Entity>(id: Uuid) -> Self {
        Self::AlreadyDeleted {
            kind: T::KIND,
            id,
        }
    }

    pub fn conflict<T: Entity>(id: Uuid, expected: i64, found: i64) -> Self {
        Self::ConcurrencyConflict {
            kind: T::KIND,
            id,
            expected,
            found,
        }
    }

    /// Check if this error is a concurrency conflict
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, StoreError::ConcurrencyConflict { .. })
    }

    /// Check if this error means the entity is absent to callers
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::EntityNotFound { .. })
    }
}
