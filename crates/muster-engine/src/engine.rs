//! `SignupEngine` - the command surface of the engine.
//!
//! A thin facade over the actor system: front-ends call these methods and
//! render the typed results; the engine itself produces no user-facing
//! text beyond the mirror renderings.

use crate::actors::{
    DirectoryActorHandle, EngineMetrics, MetricsSnapshot, OpenOutcome, RefreshOutcome,
    SignupSummary,
};
use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::mirror::SurfaceTransport;
use crate::store::RecordStore;

use std::sync::Arc;

/// Sign-up coordination engine.
///
/// Cheap to clone; clones share the same actor system.
#[derive(Clone)]
pub struct SignupEngine {
    directory: DirectoryActorHandle,
    metrics: Arc<EngineMetrics>,
}

impl SignupEngine {
    /// Build an engine over a record store and a surface transport.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        transport: Arc<dyn SurfaceTransport>,
        config: EngineConfig,
    ) -> Self {
        let metrics = EngineMetrics::new();
        let directory =
            DirectoryActorHandle::new(store, transport, config, Arc::clone(&metrics));
        Self { directory, metrics }
    }

    /// Provision a tenant namespace (idempotent "first contact").
    pub async fn create_tenant(&self, tenant: &str) -> Result<(), EngineError> {
        self.directory.create_tenant(tenant.to_string()).await
    }

    /// Destroy a tenant and every sign-up it contains.
    /// Returns whether the tenant existed.
    pub async fn delete_tenant(&self, tenant: &str) -> Result<bool, EngineError> {
        self.directory.delete_tenant(tenant.to_string()).await
    }

    /// Destroy and recreate a tenant in one step, tolerating absence.
    pub async fn reset_tenant(&self, tenant: &str) -> Result<(), EngineError> {
        self.directory.reset_tenant(tenant.to_string()).await
    }

    /// Create a sign-up with no registered surfaces.
    pub async fn create(
        &self,
        tenant: &str,
        id: &str,
        description: &str,
    ) -> Result<(), EngineError> {
        let signup = self.signup(tenant, id).await?;
        signup.create(description.to_string()).await
    }

    /// Delete a sign-up, whatever its state. Open mirrors are abandoned.
    pub async fn delete(&self, tenant: &str, id: &str) -> Result<(), EngineError> {
        let signup = self.signup(tenant, id).await?;
        signup.delete().await
    }

    /// Register a surface for broadcast. Only legal while closed.
    pub async fn add_surface(
        &self,
        tenant: &str,
        id: &str,
        surface: &str,
    ) -> Result<(), EngineError> {
        let signup = self.signup(tenant, id).await?;
        signup.add_surface(surface.to_string()).await
    }

    /// Unregister a surface. Only legal while closed.
    pub async fn remove_surface(
        &self,
        tenant: &str,
        id: &str,
        surface: &str,
    ) -> Result<(), EngineError> {
        let signup = self.signup(tenant, id).await?;
        signup.remove_surface(surface.to_string()).await
    }

    /// Open a sign-up: post an initial mirror to every registered surface.
    ///
    /// The outcome carries the partial-failure count; surfaces that failed
    /// get no mirror and are absent from future updates.
    pub async fn open(&self, tenant: &str, id: &str) -> Result<OpenOutcome, EngineError> {
        let signup = self.signup(tenant, id).await?;
        signup.open().await
    }

    /// Close a sign-up, discarding members and mirrors.
    pub async fn close(&self, tenant: &str, id: &str) -> Result<(), EngineError> {
        let signup = self.signup(tenant, id).await?;
        signup.close().await
    }

    /// Add a participant to an open sign-up and refresh its mirrors.
    /// Joining twice is a no-op.
    pub async fn join(
        &self,
        tenant: &str,
        id: &str,
        participant: &str,
    ) -> Result<RefreshOutcome, EngineError> {
        let signup = self.signup(tenant, id).await?;
        signup.join(participant.to_string()).await
    }

    /// Remove a participant from an open sign-up and refresh its mirrors.
    /// Leaving without having joined is a no-op.
    pub async fn leave(
        &self,
        tenant: &str,
        id: &str,
        participant: &str,
    ) -> Result<RefreshOutcome, EngineError> {
        let signup = self.signup(tenant, id).await?;
        signup.leave(participant.to_string()).await
    }

    /// Re-push the current membership snapshot to every mirror.
    /// Used after a restart, since no other change-detection exists.
    pub async fn resync(&self, tenant: &str, id: &str) -> Result<RefreshOutcome, EngineError> {
        let signup = self.signup(tenant, id).await?;
        signup.resync().await
    }

    /// Summaries of all sign-ups in a tenant, ordered by id.
    pub async fn list_signups(&self, tenant: &str) -> Result<Vec<SignupSummary>, EngineError> {
        self.directory.list_signups(tenant.to_string()).await
    }

    /// Current engine counters.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Shut down the actor system. In-flight operations complete; new
    /// operations fail with an internal error.
    pub fn shutdown(&self) {
        self.directory.cancel();
    }

    async fn signup(
        &self,
        tenant: &str,
        id: &str,
    ) -> Result<crate::actors::SignupActorHandle, EngineError> {
        self.directory
            .signup(tenant.to_string(), id.to_string())
            .await
    }
}
