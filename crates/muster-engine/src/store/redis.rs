//! Redis-backed record store.
//!
//! # Key Patterns
//!
//! - `tenant:{tenant}` - tenant marker
//! - `tenant:{tenant}:signups` - SET of sign-up ids in the tenant
//! - `signup:{tenant}:{id}` - sign-up record (JSON)
//!
//! # Connection Pattern
//!
//! The redis-rs `MultiplexedConnection` is designed to be cloned cheaply and
//! used concurrently. No locking is needed - just clone the connection for
//! each operation.

use super::{RecordStore, StoreError};
use crate::record::SignupRecord;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tracing::{debug, error, warn};

/// Redis record store.
///
/// Cheaply cloneable; each operation clones the multiplexed connection
/// rather than sharing it behind a lock.
#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
}

fn tenant_key(tenant: &str) -> String {
    format!("tenant:{tenant}")
}

fn tenant_set_key(tenant: &str) -> String {
    format!("tenant:{tenant}:signups")
}

fn signup_key(tenant: &str, id: &str) -> String {
    format!("signup:{tenant}:{id}")
}

impl RedisStore {
    /// Connect to Redis.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the connection cannot be
    /// established.
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        // Do NOT log redis_url, it may carry credentials.
        let client = Client::open(redis_url).map_err(|e| {
            error!(
                target: "muster.store.redis",
                error = %e,
                "Failed to open Redis client"
            );
            StoreError::Unavailable(format!("failed to open Redis client: {e}"))
        })?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                error!(
                    target: "muster.store.redis",
                    error = %e,
                    "Failed to connect to Redis"
                );
                StoreError::Unavailable(format!("failed to connect to Redis: {e}"))
            })?;

        Ok(Self { connection })
    }

    async fn require_tenant(
        &self,
        conn: &mut MultiplexedConnection,
        tenant: &str,
    ) -> Result<(), StoreError> {
        let exists: bool = conn
            .exists(tenant_key(tenant))
            .await
            .map_err(|e| StoreError::Unavailable(format!("tenant lookup failed: {e}")))?;
        if exists {
            Ok(())
        } else {
            Err(StoreError::TenantNotFound(tenant.to_string()))
        }
    }
}

#[async_trait::async_trait]
impl RecordStore for RedisStore {
    async fn create_tenant(&self, tenant: &str) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let _: () = conn
            .set(tenant_key(tenant), 1)
            .await
            .map_err(|e| StoreError::Unavailable(format!("tenant create failed: {e}")))?;
        debug!(
            target: "muster.store.redis",
            tenant = %tenant,
            "Tenant provisioned"
        );
        Ok(())
    }

    async fn delete_tenant(&self, tenant: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection.clone();

        let existed: bool = conn
            .exists(tenant_key(tenant))
            .await
            .map_err(|e| StoreError::Unavailable(format!("tenant lookup failed: {e}")))?;
        if !existed {
            return Ok(false);
        }

        let ids: Vec<String> = conn
            .smembers(tenant_set_key(tenant))
            .await
            .map_err(|e| StoreError::Unavailable(format!("tenant listing failed: {e}")))?;

        let mut keys: Vec<String> = ids.iter().map(|id| signup_key(tenant, id)).collect();
        keys.push(tenant_set_key(tenant));
        keys.push(tenant_key(tenant));

        let _: () = conn
            .del(keys)
            .await
            .map_err(|e| StoreError::Unavailable(format!("tenant delete failed: {e}")))?;

        debug!(
            target: "muster.store.redis",
            tenant = %tenant,
            signups = ids.len(),
            "Tenant deleted"
        );
        Ok(true)
    }

    async fn get(&self, tenant: &str, id: &str) -> Result<Option<SignupRecord>, StoreError> {
        let mut conn = self.connection.clone();
        self.require_tenant(&mut conn, tenant).await?;

        let raw: Option<String> = conn
            .get(signup_key(tenant, id))
            .await
            .map_err(|e| StoreError::Unavailable(format!("record get failed: {e}")))?;

        match raw {
            None => Ok(None),
            Some(json) => {
                let record = serde_json::from_str(&json).map_err(|e| {
                    warn!(
                        target: "muster.store.redis",
                        tenant = %tenant,
                        signup_id = %id,
                        error = %e,
                        "Stored record is malformed"
                    );
                    StoreError::Unavailable(format!("malformed record for {id}: {e}"))
                })?;
                Ok(Some(record))
            }
        }
    }

    async fn put(&self, tenant: &str, id: &str, record: &SignupRecord) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        self.require_tenant(&mut conn, tenant).await?;

        let json = serde_json::to_string(record)
            .map_err(|e| StoreError::Unavailable(format!("record serialization failed: {e}")))?;

        let _: () = conn
            .set(signup_key(tenant, id), json)
            .await
            .map_err(|e| StoreError::Unavailable(format!("record put failed: {e}")))?;
        let _: () = conn
            .sadd(tenant_set_key(tenant), id)
            .await
            .map_err(|e| StoreError::Unavailable(format!("record index failed: {e}")))?;
        Ok(())
    }

    async fn delete(&self, tenant: &str, id: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection.clone();
        self.require_tenant(&mut conn, tenant).await?;

        let removed: i64 = conn
            .del(signup_key(tenant, id))
            .await
            .map_err(|e| StoreError::Unavailable(format!("record delete failed: {e}")))?;
        let _: () = conn
            .srem(tenant_set_key(tenant), id)
            .await
            .map_err(|e| StoreError::Unavailable(format!("record unindex failed: {e}")))?;
        Ok(removed > 0)
    }

    async fn list(&self, tenant: &str) -> Result<Vec<SignupRecord>, StoreError> {
        let mut conn = self.connection.clone();
        self.require_tenant(&mut conn, tenant).await?;

        let ids: Vec<String> = conn
            .smembers(tenant_set_key(tenant))
            .await
            .map_err(|e| StoreError::Unavailable(format!("tenant listing failed: {e}")))?;

        let mut records = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(record) = self.get(tenant, id).await? {
                records.push(record);
            }
        }
        Ok(records)
    }
}
