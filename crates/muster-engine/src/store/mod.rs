//! Record store capability.
//!
//! The store is the single source of truth for sign-up state. It is
//! namespaced by tenant and atomic at the granularity of one record: a get
//! racing a put observes the put's value or a strictly earlier one, never a
//! partial write. The engine mutates records only from inside a sign-up's
//! exclusion domain, so backends do not need cross-record transactions.

mod memory;
mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

use crate::record::SignupRecord;
use thiserror::Error;

/// Record store failure modes.
///
/// `TenantNotFound` is expected and handled by callers; `Unavailable` is
/// fatal to the calling operation and surfaced as-is, never retried.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The tenant namespace does not exist.
    #[error("tenant not found: {0}")]
    TenantNotFound(String),

    /// The persistence layer is unreachable or returned a malformed record.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable, per-tenant key-value store for sign-up records.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Provision a tenant namespace. Idempotent: provisioning an existing
    /// tenant is a no-op.
    async fn create_tenant(&self, tenant: &str) -> Result<(), StoreError>;

    /// Destroy a tenant and every sign-up it contains. Returns `false` if
    /// the tenant did not exist.
    async fn delete_tenant(&self, tenant: &str) -> Result<bool, StoreError>;

    /// Fetch one record. `Ok(None)` means the sign-up is unknown.
    async fn get(&self, tenant: &str, id: &str) -> Result<Option<SignupRecord>, StoreError>;

    /// Write one record, replacing any previous value.
    async fn put(&self, tenant: &str, id: &str, record: &SignupRecord) -> Result<(), StoreError>;

    /// Remove one record. Returns `false` if it was absent.
    async fn delete(&self, tenant: &str, id: &str) -> Result<bool, StoreError>;

    /// All records in a tenant, in unspecified order.
    async fn list(&self, tenant: &str) -> Result<Vec<SignupRecord>, StoreError>;
}
