//! carRental Library
//!
//! Versioned aggregate stores, the booking engine and cache-aside reads.

pub mod app;
pub mod booking;
pub mod cache;
pub mod domain;
pub mod handlers;
pub mod store;

pub mod config;
pub mod db;
mod error;

pub use app::AppState;
pub use config::Config;
pub use error::{AppError, AppResult, ErrorResponse};
pub use domain::{Car, Customer, DomainError, Entity, Rental, RentalStatus, Service};
pub use store::StoreError;
