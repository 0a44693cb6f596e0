//! Car Aggregate

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entity::sealed::MetaAccess;
use super::entity::{Entity, EntityMeta};
use super::service::Service;

/// A rentable car.
///
/// At most one active car may exist per (model, car_type) pair; the rule is
/// checked when a car is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    meta: EntityMeta,

    /// Model name, e.g. "Corolla"
    pub model: String,

    /// Category, e.g. "Sedan"
    pub car_type: String,

    /// Maintenance services for this car.
    ///
    /// Only filled by the "car with services" read; never written through
    /// the car row.
    #[serde(default)]
    pub services: Vec<Service>,
}

impl Car {
    pub fn new(model: impl Into<String>, car_type: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), model, car_type)
    }

    pub fn with_id(id: Uuid, model: impl Into<String>, car_type: impl Into<String>) -> Self {
        Self {
            meta: EntityMeta::new(id),
            model: model.into(),
            car_type: car_type.into(),
            services: Vec::new(),
        }
    }

    pub(crate) fn restore(meta: EntityMeta, model: String, car_type: String) -> Self {
        Self {
            meta,
            model,
            car_type,
            services: Vec::new(),
        }
    }

    /// True if this car is the given model and category
    pub fn matches(&self, model: &str, car_type: &str) -> bool {
        self.model == model && self.car_type == car_type
    }
}

impl Entity for Car {
    const KIND: &'static str = "Car";

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }
}

impl MetaAccess for Car {
    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_car() {
        let car = Car::new("Corolla", "Sedan");

        assert_eq!(car.model, "Corolla");
        assert_eq!(car.car_type, "Sedan");
        assert_eq!(car.version(), 1);
        assert!(car.is_active());
        assert!(car.services.is_empty());
    }

    #[test]
    fn test_matches_is_exact() {
        let car = Car::new("Corolla", "Sedan");

        assert!(car.matches("Corolla", "Sedan"));
        assert!(!car.matches("corolla", "Sedan"));
        assert!(!car.matches("Corolla", "SUV"));
    }
}
