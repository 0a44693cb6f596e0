//! Service Handler
//!
//! Maintenance scheduling: at most one active service per car and date.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::domain::{DomainError, Entity, ScheduledService, Service};
use crate::error::{AppError, AppResult};
use crate::store::{CarStore, ServiceStore};

use super::{RescheduleServiceCommand, ScheduleServiceCommand};

/// Length of the default upcoming-services window
pub const UPCOMING_WINDOW_DAYS: i64 = 14;

/// Handler for service commands and reads
#[derive(Clone)]
pub struct ServiceHandler {
    services: Arc<dyn ServiceStore>,
    cars: Arc<dyn CarStore>,
    /// Uncached store for the per-(car, date) uniqueness check
    source: Arc<dyn ServiceStore>,
}

impl ServiceHandler {
    pub fn new(
        services: Arc<dyn ServiceStore>,
        cars: Arc<dyn CarStore>,
        source: Arc<dyn ServiceStore>,
    ) -> Self {
        Self {
            services,
            cars,
            source,
        }
    }

    /// Schedule a service for an active car
    pub async fn schedule(&self, command: ScheduleServiceCommand) -> AppResult<Service> {
        self.cars.require_active(command.car_id).await?;
        self.ensure_unique(command.car_id, command.date, None)
            .await?;

        Ok(self
            .services
            .add(Service::new(command.car_id, command.date))
            .await?)
    }

    /// Move a service to another date, guarded by the caller's version
    pub async fn reschedule(&self, command: RescheduleServiceCommand) -> AppResult<Service> {
        let mut service = self.services.require_active(command.service_id).await?;

        self.ensure_unique(service.car_id, command.date, Some(service.id()))
            .await?;

        service.date = command.date;
        Ok(self
            .services
            .update_with_version(service, command.version)
            .await?)
    }

    /// Cancel a scheduled service (soft delete)
    pub async fn cancel(&self, service_id: Uuid) -> AppResult<Service> {
        let service = self.services.require_active(service_id).await?;
        Ok(self.services.delete(&service).await?)
    }

    /// Services scheduled within `[from, to]`
    pub async fn upcoming(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<ScheduledService>> {
        if from > to {
            return Err(AppError::InvalidRequest(
                "'from' must not be after 'to'".to_string(),
            ));
        }
        Ok(self.services.list_scheduled(from, to).await?)
    }

    /// Services scheduled in the two weeks starting `today`
    pub async fn upcoming_two_weeks(&self, today: NaiveDate) -> AppResult<Vec<ScheduledService>> {
        self.upcoming(today, today + Duration::days(UPCOMING_WINDOW_DAYS))
            .await
    }

    async fn ensure_unique(
        &self,
        car_id: Uuid,
        date: NaiveDate,
        except: Option<Uuid>,
    ) -> AppResult<()> {
        let existing: Vec<Service> = self
            .source
            .find_active_by_car_and_date(car_id, date)
            .await?
            .into_iter()
            .filter(|service| Some(service.id()) != except)
            .collect();

        match existing.len() {
            0 => Ok(()),
            1 => Err(DomainError::duplicate(Service::KIND, format!("car {car_id} on {date}")).into()),
            n => Err(DomainError::DataInconsistency(format!(
                "{n} active services for car {car_id} on {date}"
            ))
            .into()),
        }
    }
}
