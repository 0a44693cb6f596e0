//! Customer Aggregate

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entity::sealed::MetaAccess;
use super::entity::{Entity, EntityMeta};

/// A customer that can book rentals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    meta: EntityMeta,

    pub full_name: String,

    pub address: String,

    /// Reference to the identity in the external credential system
    pub user_id: String,
}

impl Customer {
    pub fn new(
        full_name: impl Into<String>,
        address: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            meta: EntityMeta::generate(),
            full_name: full_name.into(),
            address: address.into(),
            user_id: user_id.into(),
        }
    }

    pub(crate) fn restore(
        meta: EntityMeta,
        full_name: String,
        address: String,
        user_id: String,
    ) -> Self {
        Self {
            meta,
            full_name,
            address,
            user_id,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.meta = EntityMeta::new(id);
        self
    }
}

impl Entity for Customer {
    const KIND: &'static str = "Customer";

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }
}

impl MetaAccess for Customer {
    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }
}
