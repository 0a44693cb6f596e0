//! Booking module
//!
//! Availability checks and the rental lifecycle (create, modify, cancel)
//! on top of the aggregate stores.

mod commands;
mod engine;

pub use commands::*;
pub use engine::BookingEngine;
