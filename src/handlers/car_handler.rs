//! Car Handler
//!
//! Fleet maintenance. A car can only be added when no active car shares its
//! model and car type.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Car, DomainError, Entity};
use crate::error::AppResult;
use crate::store::CarStore;

use super::{CreateCarCommand, UpdateCarCommand};

/// Handler for car commands and reads
#[derive(Clone)]
pub struct CarHandler {
    cars: Arc<dyn CarStore>,
    /// Uncached store for the uniqueness check; lookups by model and type
    /// are only refreshed on TTL when cached
    source: Arc<dyn CarStore>,
}

impl CarHandler {
    pub fn new(cars: Arc<dyn CarStore>, source: Arc<dyn CarStore>) -> Self {
        Self { cars, source }
    }

    /// Add a car, rejecting a second active car of the same model and type
    pub async fn create(&self, command: CreateCarCommand) -> AppResult<Car> {
        self.ensure_unique(&command.model, &command.car_type)
            .await?;

        Ok(self
            .cars
            .add(Car::new(command.model, command.car_type))
            .await?)
    }

    /// Change model and type, guarded by the caller's version.
    ///
    /// Uniqueness of (model, type) is only enforced when a car is added.
    pub async fn update(&self, command: UpdateCarCommand) -> AppResult<Car> {
        let mut car = self.cars.require_active(command.car_id).await?;

        car.model = command.model;
        car.car_type = command.car_type;
        Ok(self.cars.update_with_version(car, command.version).await?)
    }

    pub async fn delete(&self, car_id: Uuid) -> AppResult<Car> {
        let car = self.cars.require_active(car_id).await?;
        Ok(self.cars.delete(&car).await?)
    }

    pub async fn get(&self, car_id: Uuid) -> AppResult<Car> {
        Ok(self.cars.require_active(car_id).await?)
    }

    /// Car with its scheduled services
    pub async fn get_with_services(&self, car_id: Uuid) -> AppResult<Car> {
        self.cars
            .get_with_services(car_id)
            .await?
            .ok_or_else(|| crate::store::StoreError::not_found::<Car>(car_id).into())
    }

    pub async fn list(&self) -> AppResult<Vec<Car>> {
        Ok(self.cars.list_all_active().await?)
    }

    async fn ensure_unique(&self, model: &str, car_type: &str) -> AppResult<()> {
        let existing = self.source.find_by_model_and_type(model, car_type).await?;

        match existing.len() {
            0 => Ok(()),
            1 => Err(DomainError::duplicate(Car::KIND, format!("{model}/{car_type}")).into()),
            n => Err(DomainError::DataInconsistency(format!(
                "{n} active cars with model '{model}' and type '{car_type}'"
            ))
            .into()),
        }
    }
}
