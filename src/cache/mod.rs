//! Cache-Aside module
//!
//! Read-through decorators over the aggregate stores. Each aggregate root
//! owns a key namespace (its type name). Writes go to the wrapped store
//! first and invalidate a fixed set of keys afterwards; parameterized
//! lookups are left to expire on their TTL. Availability checks are never
//! cached.

mod backend;
mod car;
mod customer;
mod handle;
mod keys;
mod memory;
mod rental;
mod service;

use std::time::Duration;

pub use backend::CacheBackend;
pub use car::CachedCarStore;
pub use customer::CachedCustomerStore;
pub use handle::EntityCache;
pub use keys::CacheKey;
pub use memory::{CacheStats, MemoryCache, DEFAULT_CAPACITY, MAX_TTL};
pub use rental::CachedRentalStore;
pub use service::CachedServiceStore;

/// Default TTL for cached reads
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

/// TTL for the "all-active" listing
pub const ALL_ACTIVE_TTL: Duration = Duration::from_secs(5 * 60);

/// Time-to-live per kind of cached read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtl {
    pub default: Duration,
    pub all_active: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            default: DEFAULT_TTL,
            all_active: ALL_ACTIVE_TTL,
        }
    }
}

impl CacheTtl {
    /// TTL for a given key
    pub fn for_key(&self, key: &CacheKey) -> Duration {
        match key {
            CacheKey::AllActive => self.all_active,
            _ => self.default,
        }
    }
}
