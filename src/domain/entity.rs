//! Versioned Entity
//!
//! Identity, soft-delete flag and optimistic-concurrency version shared by
//! every aggregate root.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

/// Version assigned to a freshly added entity
pub const INITIAL_VERSION: i64 = 1;

/// Identity and lifecycle metadata carried by every aggregate root.
///
/// Fields are only writable from inside the crate: the stores are the sole
/// writers of `active` and `version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    id: Uuid,
    active: bool,
    version: i64,
}

impl EntityMeta {
    /// Metadata for an entity that has not been stored yet
    pub(crate) fn new(id: Uuid) -> Self {
        Self {
            id,
            active: true,
            version: INITIAL_VERSION,
        }
    }

    /// Metadata with a freshly generated id
    pub(crate) fn generate() -> Self {
        Self::new(Uuid::new_v4())
    }

    /// Rebuild metadata read back from storage
    pub(crate) fn restore(id: Uuid, active: bool, version: i64) -> Self {
        Self {
            id,
            active,
            version,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    /// Stamp as a new active row at the initial version
    pub(crate) fn stamp_added(&mut self) {
        self.active = true;
        self.version = INITIAL_VERSION;
    }

    pub(crate) fn set_version(&mut self, version: i64) {
        self.version = version;
    }

    pub(crate) fn mark_deleted(&mut self, version: i64) {
        self.active = false;
        self.version = version;
    }
}

pub(crate) mod sealed {
    use super::EntityMeta;

    /// Write access to the metadata; only nameable inside the crate
    pub trait MetaAccess {
        fn meta_mut(&mut self) -> &mut EntityMeta;
    }
}

/// Capability shared by every aggregate root (Car, Customer, Rental, Service).
///
/// Implementable only inside the crate. Outside callers can read the
/// metadata but not replace it:
///
/// ```compile_fail
/// use car_rental::{Car, Entity};
///
/// let mut car = Car::new("Corolla", "Sedan");
/// car.meta_mut();
/// ```
///
/// ```compile_fail
/// use car_rental::domain::EntityMeta;
///
/// let _meta = EntityMeta::new(uuid::Uuid::new_v4());
/// ```
pub trait Entity:
    sealed::MetaAccess + Clone + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Type name, used for cache namespaces and error messages
    const KIND: &'static str;

    fn meta(&self) -> &EntityMeta;

    fn id(&self) -> Uuid {
        self.meta().id()
    }

    fn version(&self) -> i64 {
        self.meta().version()
    }

    fn is_active(&self) -> bool {
        self.meta().is_active()
    }
}
