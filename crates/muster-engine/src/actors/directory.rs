//! `DirectoryActor` - singleton supervisor for sign-up actors.
//!
//! The directory is the top-level actor:
//!
//! - Owns the map of per-`(tenant, id)` `SignupActor`s and spawns them on
//!   first touch of an identifier
//! - Handles tenant provisioning, deletion and reset
//! - Serves tenant listings
//! - Owns the root `CancellationToken` for shutdown
//!
//! Tenant deletion drops the tenant's actor entries rather than cancelling
//! them: a dropped actor drains its remaining mailbox (every operation
//! re-checks the store, so drained operations fail with `NotFound`) and
//! exits when its last sender goes away.

use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::mirror::SurfaceTransport;
use crate::store::{RecordStore, StoreError};

use super::messages::{DirectoryMessage, SignupSummary};
use super::metrics::EngineMetrics;
use super::signup::{SignupActor, SignupActorHandle};

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Handle to the `DirectoryActor`.
///
/// This is the routing layer under the engine facade. All methods are
/// async and return results via oneshot channels.
#[derive(Clone)]
pub struct DirectoryActorHandle {
    sender: mpsc::Sender<DirectoryMessage>,
    cancel_token: CancellationToken,
}

impl DirectoryActorHandle {
    /// Spawn the directory actor and return a handle to it.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        transport: Arc<dyn SurfaceTransport>,
        config: EngineConfig,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(config.directory_mailbox_buffer);
        let cancel_token = CancellationToken::new();

        let actor = DirectoryActor {
            store,
            transport,
            config,
            metrics,
            receiver,
            cancel_token: cancel_token.clone(),
            signups: HashMap::new(),
        };

        tokio::spawn(actor.run());

        Self {
            sender,
            cancel_token,
        }
    }

    /// Provision a tenant namespace (idempotent).
    pub async fn create_tenant(&self, tenant: String) -> Result<(), EngineError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(DirectoryMessage::CreateTenant {
                tenant,
                respond_to: tx,
            })
            .await
            .map_err(|e| EngineError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| EngineError::Internal(format!("response receive failed: {e}")))?
    }

    /// Destroy a tenant and everything in it. Returns whether it existed.
    pub async fn delete_tenant(&self, tenant: String) -> Result<bool, EngineError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(DirectoryMessage::DeleteTenant {
                tenant,
                respond_to: tx,
            })
            .await
            .map_err(|e| EngineError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| EngineError::Internal(format!("response receive failed: {e}")))?
    }

    /// Destroy and recreate a tenant, tolerating absence.
    pub async fn reset_tenant(&self, tenant: String) -> Result<(), EngineError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(DirectoryMessage::ResetTenant {
                tenant,
                respond_to: tx,
            })
            .await
            .map_err(|e| EngineError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| EngineError::Internal(format!("response receive failed: {e}")))?
    }

    /// Summaries of all sign-ups in a tenant, ordered by id.
    pub async fn list_signups(&self, tenant: String) -> Result<Vec<SignupSummary>, EngineError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(DirectoryMessage::ListSignups {
                tenant,
                respond_to: tx,
            })
            .await
            .map_err(|e| EngineError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| EngineError::Internal(format!("response receive failed: {e}")))?
    }

    /// Get the serialization actor for a sign-up, spawning it on first
    /// touch of the identifier.
    pub async fn signup(&self, tenant: String, id: String) -> Result<SignupActorHandle, EngineError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(DirectoryMessage::Signup {
                tenant,
                id,
                respond_to: tx,
            })
            .await
            .map_err(|e| EngineError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| EngineError::Internal(format!("response receive failed: {e}")))
    }

    /// Cancel the directory and every sign-up actor under it.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the directory is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

struct SignupEntry {
    handle: SignupActorHandle,
    /// Kept so the task detaches (rather than aborts) when the entry is
    /// dropped.
    #[allow(dead_code)]
    task: JoinHandle<()>,
}

/// Singleton supervisor actor.
struct DirectoryActor {
    store: Arc<dyn RecordStore>,
    transport: Arc<dyn SurfaceTransport>,
    config: EngineConfig,
    metrics: Arc<EngineMetrics>,
    receiver: mpsc::Receiver<DirectoryMessage>,
    cancel_token: CancellationToken,
    /// Live serialization actors, keyed by `(tenant, id)`.
    signups: HashMap<(String, String), SignupEntry>,
}

impl DirectoryActor {
    async fn run(mut self) {
        info!(
            target: "muster.actor.directory",
            "DirectoryActor started"
        );

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "muster.actor.directory",
                        signups = self.signups.len(),
                        "DirectoryActor received cancellation signal"
                    );
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.handle_message(message).await;
                            self.metrics.record_message_processed();
                        }
                        None => {
                            info!(
                                target: "muster.actor.directory",
                                "DirectoryActor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn handle_message(&mut self, message: DirectoryMessage) {
        match message {
            DirectoryMessage::CreateTenant { tenant, respond_to } => {
                let result = self.handle_create_tenant(&tenant).await;
                let _ = respond_to.send(result);
            }

            DirectoryMessage::DeleteTenant { tenant, respond_to } => {
                let result = self.handle_delete_tenant(&tenant).await;
                let _ = respond_to.send(result);
            }

            DirectoryMessage::ResetTenant { tenant, respond_to } => {
                let result = self.handle_reset_tenant(&tenant).await;
                let _ = respond_to.send(result);
            }

            DirectoryMessage::ListSignups { tenant, respond_to } => {
                let result = self.handle_list_signups(&tenant).await;
                let _ = respond_to.send(result);
            }

            DirectoryMessage::Signup {
                tenant,
                id,
                respond_to,
            } => {
                let handle = self.get_or_spawn(tenant, id);
                let _ = respond_to.send(handle);
            }
        }
    }

    async fn handle_create_tenant(&self, tenant: &str) -> Result<(), EngineError> {
        self.store.create_tenant(tenant).await?;
        info!(
            target: "muster.actor.directory",
            tenant = %tenant,
            "Tenant provisioned"
        );
        Ok(())
    }

    async fn handle_delete_tenant(&mut self, tenant: &str) -> Result<bool, EngineError> {
        self.drop_tenant_actors(tenant);
        let existed = self.store.delete_tenant(tenant).await?;
        if existed {
            info!(
                target: "muster.actor.directory",
                tenant = %tenant,
                "Tenant deleted"
            );
        } else {
            debug!(
                target: "muster.actor.directory",
                tenant = %tenant,
                "Tenant delete was a no-op"
            );
        }
        Ok(existed)
    }

    async fn handle_reset_tenant(&mut self, tenant: &str) -> Result<(), EngineError> {
        self.drop_tenant_actors(tenant);
        self.store.delete_tenant(tenant).await?;
        self.store.create_tenant(tenant).await?;
        info!(
            target: "muster.actor.directory",
            tenant = %tenant,
            "Tenant reset"
        );
        Ok(())
    }

    async fn handle_list_signups(&self, tenant: &str) -> Result<Vec<SignupSummary>, EngineError> {
        let records = match self.store.list(tenant).await {
            Ok(records) => records,
            Err(StoreError::TenantNotFound(t)) => return Err(EngineError::NotFound(t)),
            Err(e) => return Err(e.into()),
        };

        let mut summaries: Vec<SignupSummary> = records
            .into_iter()
            .map(|record| SignupSummary {
                surface_count: record.surfaces.len(),
                is_open: record.is_open(),
                id: record.id,
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(summaries)
    }

    fn get_or_spawn(&mut self, tenant: String, id: String) -> SignupActorHandle {
        let key = (tenant, id);
        if let Some(entry) = self.signups.get(&key) {
            return entry.handle.clone();
        }

        let (tenant, id) = key.clone();
        let (handle, task) = SignupActor::spawn(
            tenant,
            id,
            Arc::clone(&self.store),
            Arc::clone(&self.transport),
            &self.config,
            self.cancel_token.child_token(),
            Arc::clone(&self.metrics),
        );

        debug!(
            target: "muster.actor.directory",
            tenant = %handle.tenant(),
            signup_id = %handle.id(),
            "Spawned sign-up actor"
        );

        self.signups.insert(
            key,
            SignupEntry {
                handle: handle.clone(),
                task,
            },
        );
        handle
    }

    fn drop_tenant_actors(&mut self, tenant: &str) {
        let before = self.signups.len();
        self.signups.retain(|(t, _), _| t != tenant);
        let dropped = before - self.signups.len();
        if dropped > 0 {
            debug!(
                target: "muster.actor.directory",
                tenant = %tenant,
                dropped,
                "Dropped sign-up actors with their tenant"
            );
        }
    }
}
