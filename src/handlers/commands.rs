//! Command definitions
//!
//! Commands represent intentions to change the fleet and customer records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =========================================================================
// Cars
// =========================================================================

/// Command to add a car to the fleet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCarCommand {
    pub model: String,
    pub car_type: String,
}

impl CreateCarCommand {
    pub fn new(model: impl Into<String>, car_type: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            car_type: car_type.into(),
        }
    }
}

/// Command to change a car's model or category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCarCommand {
    pub car_id: Uuid,
    pub model: String,
    pub car_type: String,
    /// Version the caller read
    pub version: i64,
}

impl UpdateCarCommand {
    pub fn new(
        car_id: Uuid,
        model: impl Into<String>,
        car_type: impl Into<String>,
        version: i64,
    ) -> Self {
        Self {
            car_id,
            model: model.into(),
            car_type: car_type.into(),
            version,
        }
    }
}

// =========================================================================
// Customers
// =========================================================================

/// Command to register a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterCustomerCommand {
    pub full_name: String,
    pub address: String,
    /// Identity in the external credential system
    pub user_id: String,
}

impl RegisterCustomerCommand {
    pub fn new(full_name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            address: address.into(),
            user_id: String::new(),
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }
}

/// Command to change a customer's contact details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCustomerCommand {
    pub customer_id: Uuid,
    pub full_name: String,
    pub address: String,
    pub version: i64,
}

impl UpdateCustomerCommand {
    pub fn new(
        customer_id: Uuid,
        full_name: impl Into<String>,
        address: impl Into<String>,
        version: i64,
    ) -> Self {
        Self {
            customer_id,
            full_name: full_name.into(),
            address: address.into(),
            version,
        }
    }
}

// =========================================================================
// Services
// =========================================================================

/// Command to schedule maintenance for a car
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleServiceCommand {
    pub car_id: Uuid,
    pub date: NaiveDate,
}

impl ScheduleServiceCommand {
    pub fn new(car_id: Uuid, date: NaiveDate) -> Self {
        Self { car_id, date }
    }
}

/// Command to move a scheduled service to another date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleServiceCommand {
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub version: i64,
}

impl RescheduleServiceCommand {
    pub fn new(service_id: Uuid, date: NaiveDate, version: i64) -> Self {
        Self {
            service_id,
            date,
            version,
        }
    }
}
