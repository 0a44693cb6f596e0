//! Domain module
//!
//! Aggregate roots, the shared versioned-entity capability and business errors.

pub mod car;
pub mod customer;
pub mod entity;
pub mod error;
pub mod rental;
pub mod service;

pub use car::Car;
pub use customer::Customer;
pub use entity::{Entity, EntityMeta, INITIAL_VERSION};
pub use error::DomainError;
pub use rental::{ranges_overlap, Rental, RentalDetails, RentalStatus};
pub use service::{ScheduledService, Service};
