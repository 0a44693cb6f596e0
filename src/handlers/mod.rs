//! Command Handlers module
//!
//! Thin orchestration over the stores for fleet, customer and maintenance
//! records. Rental commands go through [`crate::booking::BookingEngine`].

mod car_handler;
mod commands;
mod customer_handler;
mod service_handler;


pub use car_handler::CarHandler;
pub use commands::*;
pub use customer_handler::CustomerHandler;
pub use service_handler::{ServiceHandler, UPCOMING_WINDOW_DAYS};
