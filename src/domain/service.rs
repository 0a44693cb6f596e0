//! Service Aggregate
//!
//! A scheduled maintenance slot for a car.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entity::sealed::MetaAccess;
use super::entity::{Entity, EntityMeta};

/// Maintenance service for a car on a given date.
///
/// At most one active service may exist per (car, date) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    meta: EntityMeta,

    pub car_id: Uuid,

    pub date: NaiveDate,
}

impl Service {
    pub fn new(car_id: Uuid, date: NaiveDate) -> Self {
        Self {
            meta: EntityMeta::generate(),
            car_id,
            date,
        }
    }

    pub(crate) fn restore(meta: EntityMeta, car_id: Uuid, date: NaiveDate) -> Self {
        Self { meta, car_id, date }
    }
}

impl Entity for Service {
    const KIND: &'static str = "Service";

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }
}

impl MetaAccess for Service {
    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }
}

/// Upcoming service joined with its car, as listed for the maintenance calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledService {
    pub car_id: Uuid,
    pub model: String,
    pub car_type: String,
    pub date: NaiveDate,
}
