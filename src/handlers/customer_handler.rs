//! Customer Handler

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Customer, DomainError};
use crate::error::AppResult;
use crate::store::CustomerStore;

use super::{RegisterCustomerCommand, UpdateCustomerCommand};

/// Handler for customer commands and reads
#[derive(Clone)]
pub struct CustomerHandler {
    customers: Arc<dyn CustomerStore>,
}

impl CustomerHandler {
    pub fn new(customers: Arc<dyn CustomerStore>) -> Self {
        Self { customers }
    }

    pub async fn register(&self, command: RegisterCustomerCommand) -> AppResult<Customer> {
        let customer = Customer::new(command.full_name, command.address, command.user_id);
        Ok(self.customers.add(customer).await?)
    }

    /// Change contact details, guarded by the caller's version
    pub async fn update(&self, command: UpdateCustomerCommand) -> AppResult<Customer> {
        let mut customer = self.customers.require_active(command.customer_id).await?;

        customer.full_name = command.full_name;
        customer.address = command.address;
        Ok(self
            .customers
            .update_with_version(customer, command.version)
            .await?)
    }

    pub async fn delete(&self, customer_id: Uuid) -> AppResult<Customer> {
        let customer = self.customers.require_active(customer_id).await?;
        Ok(self.customers.delete(&customer).await?)
    }

    pub async fn get(&self, customer_id: Uuid) -> AppResult<Customer> {
        Ok(self.customers.require_active(customer_id).await?)
    }

    pub async fn list(&self) -> AppResult<Vec<Customer>> {
        Ok(self.customers.list_all_active().await?)
    }

    /// Customer linked to an external identity, if any
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<Customer>> {
        let mut found = self.customers.find_active_by_user_id(user_id).await?;

        if found.len() > 1 {
            return Err(DomainError::DataInconsistency(format!(
                "{} active customers linked to user '{user_id}'",
                found.len()
            ))
            .into());
        }
        Ok(found.pop())
    }
}
