//! Error handling module
//!
//! Centralized error type and the transport-neutral mapping a request
//! handling collaborator uses to answer its callers.

use serde::Serialize;

use crate::domain::DomainError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Store outcomes (not found, version conflicts, database failures)
    #[error(transparent)]
    Store(#[from] StoreError),

    // Server errors (5xx)
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Store(StoreError::Database(e))
    }
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    /// Check if the caller should reload and retry
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, AppError::Store(e) if e.is_concurrency_conflict())
    }

    /// Check if the error means an entity is absent or soft-deleted
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::Store(e) if e.is_not_found())
    }

    /// HTTP-style status code
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::InvalidRequest(_) => 400,
            AppError::Domain(e) => match e {
                DomainError::InvalidRange { .. } => 400,
                DomainError::NotAvailable { .. } | DomainError::DuplicateEntity { .. } => 409,
                DomainError::DataInconsistency(_) => 500,
            },
            AppError::Store(e) => match e {
                StoreError::EntityNotFound { .. } => 404,
                StoreError::AlreadyDeleted { .. }
                | StoreError::DuplicateKey { .. }
                | StoreError::ConcurrencyConflict { .. }
                | StoreError::BookingConflict { .. } => 409,
                StoreError::InvalidData(_) | StoreError::Database(_) => 500,
            },
            AppError::Internal(_) | AppError::Config(_) => 500,
        }
    }

    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::Domain(e) => match e {
                DomainError::NotAvailable { .. } => "not_available",
                DomainError::InvalidRange { .. } => "invalid_range",
                DomainError::DuplicateEntity { .. } => "duplicate_entity",
                DomainError::DataInconsistency(_) => "data_inconsistency",
            },
            AppError::Store(e) => match e {
                StoreError::EntityNotFound { .. } => "entity_not_found",
                StoreError::AlreadyDeleted { .. } => "already_deleted",
                StoreError::DuplicateKey { .. } => "duplicate_key",
                StoreError::ConcurrencyConflict { .. } => "version_conflict",
                StoreError::BookingConflict { .. } => "not_available",
                StoreError::InvalidData(_) => "invalid_data",
                StoreError::Database(_) => "database_error",
            },
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
        }
    }

    /// Response body; server-side failures are logged and their details withheld
    pub fn to_response(&self) -> ErrorResponse {
        let details = match self {
            AppError::InvalidRequest(msg) => Some(msg.clone()),
            AppError::Store(StoreError::ConcurrencyConflict {
                expected, found, ..
            }) => Some(format!("expected {}, found {}", expected, found)),
            _ if self.status_code() >= 500 => {
                tracing::error!("{}: {:?}", self.error_code(), self);
                None
            }
            _ => None,
        };

        ErrorResponse {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Car;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_store_errors_map_to_status() {
        let id = Uuid::new_v4();

        let err = AppError::from(StoreError::not_found::<Car>(id));
        assert_eq!(err.status_code(), 404);
        assert!(err.is_not_found());

        let err = AppError::from(StoreError::conflict::<Car>(id, 1, 2));
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "version_conflict");
        assert!(err.is_concurrency_conflict());
        assert_eq!(err.to_response().details.as_deref(), Some("expected 1, found 2"));
    }

    #[test]
    fn test_domain_errors_map_to_status() {
        let now = Utc::now();

        let err = AppError::from(DomainError::not_available(Uuid::new_v4(), now, now));
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "not_available");

        let err = AppError::from(DomainError::InvalidRange { start: now, end: now });
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = AppError::Internal("pool exhausted".to_string());
        let body = err.to_response();

        assert_eq!(body.error_code, "internal_error");
        assert!(body.details.is_none());
    }
}
