//! In-memory record store.
//!
//! Default backend for tests and embedded use. A `tokio::sync::RwLock`
//! over nested maps gives the per-record atomicity the contract asks for;
//! durability is explicitly not provided.

use super::{RecordStore, StoreError};
use crate::record::SignupRecord;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Volatile record store backed by nested `HashMap`s.
#[derive(Default)]
pub struct MemoryStore {
    tenants: RwLock<HashMap<String, HashMap<String, SignupRecord>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn create_tenant(&self, tenant: &str) -> Result<(), StoreError> {
        let mut tenants = self.tenants.write().await;
        tenants.entry(tenant.to_string()).or_default();
        Ok(())
    }

    async fn delete_tenant(&self, tenant: &str) -> Result<bool, StoreError> {
        let mut tenants = self.tenants.write().await;
        Ok(tenants.remove(tenant).is_some())
    }

    async fn get(&self, tenant: &str, id: &str) -> Result<Option<SignupRecord>, StoreError> {
        let tenants = self.tenants.read().await;
        let records = tenants
            .get(tenant)
            .ok_or_else(|| StoreError::TenantNotFound(tenant.to_string()))?;
        Ok(records.get(id).cloned())
    }

    async fn put(&self, tenant: &str, id: &str, record: &SignupRecord) -> Result<(), StoreError> {
        let mut tenants = self.tenants.write().await;
        let records = tenants
            .get_mut(tenant)
            .ok_or_else(|| StoreError::TenantNotFound(tenant.to_string()))?;
        records.insert(id.to_string(), record.clone());
        Ok(())
    }

    async fn delete(&self, tenant: &str, id: &str) -> Result<bool, StoreError> {
        let mut tenants = self.tenants.write().await;
        let records = tenants
            .get_mut(tenant)
            .ok_or_else(|| StoreError::TenantNotFound(tenant.to_string()))?;
        Ok(records.remove(id).is_some())
    }

    async fn list(&self, tenant: &str) -> Result<Vec<SignupRecord>, StoreError> {
        let tenants = self.tenants.read().await;
        let records = tenants
            .get(tenant)
            .ok_or_else(|| StoreError::TenantNotFound(tenant.to_string()))?;
        Ok(records.values().cloned().collect())
    }
}
