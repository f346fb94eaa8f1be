//! `SignupActor` - per-sign-up actor that serializes all mutations for one
//! `(tenant, id)` pair.
//!
//! The actor's mailbox is the exclusion domain: `create`, `open`, `close`,
//! `join`, `leave`, surface edits and `resync` for one sign-up are handled
//! one at a time, so no two read-modify-write sequences interleave and no
//! update is lost. Operations on different sign-ups run on different actors
//! and never block each other.
//!
//! The actor holds no record state of its own; every operation re-reads the
//! store. That makes the actor a pure serialization point whose lifetime is
//! independent of the record's (a deleted sign-up can be recreated through
//! the same actor).

use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::mirror::{self, SurfaceTransport};
use crate::record::{OpenState, SignupRecord};
use crate::store::RecordStore;

use super::messages::{OpenOutcome, RefreshOutcome, SignupMessage};
use super::metrics::EngineMetrics;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Handle to a `SignupActor`.
#[derive(Clone, Debug)]
pub struct SignupActorHandle {
    sender: mpsc::Sender<SignupMessage>,
    cancel_token: CancellationToken,
    tenant: String,
    id: String,
}

impl SignupActorHandle {
    /// Tenant this actor belongs to.
    #[must_use]
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// Sign-up id this actor serializes.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Create the sign-up record.
    pub async fn create(&self, description: String) -> Result<(), EngineError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(SignupMessage::Create {
                description,
                respond_to: tx,
            })
            .await
            .map_err(|e| EngineError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| EngineError::Internal(format!("response receive failed: {e}")))?
    }

    /// Delete the sign-up record, whatever its state.
    pub async fn delete(&self) -> Result<(), EngineError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(SignupMessage::Delete { respond_to: tx })
            .await
            .map_err(|e| EngineError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| EngineError::Internal(format!("response receive failed: {e}")))?
    }

    /// Register a surface for broadcast.
    pub async fn add_surface(&self, surface: String) -> Result<(), EngineError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(SignupMessage::AddSurface {
                surface,
                respond_to: tx,
            })
            .await
            .map_err(|e| EngineError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| EngineError::Internal(format!("response receive failed: {e}")))?
    }

    /// Unregister a surface.
    pub async fn remove_surface(&self, surface: String) -> Result<(), EngineError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(SignupMessage::RemoveSurface {
                surface,
                respond_to: tx,
            })
            .await
            .map_err(|e| EngineError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| EngineError::Internal(format!("response receive failed: {e}")))?
    }

    /// Open the sign-up and post mirrors.
    pub async fn open(&self) -> Result<OpenOutcome, EngineError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(SignupMessage::Open { respond_to: tx })
            .await
            .map_err(|e| EngineError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| EngineError::Internal(format!("response receive failed: {e}")))?
    }

    /// Close the sign-up.
    pub async fn close(&self) -> Result<(), EngineError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(SignupMessage::Close { respond_to: tx })
            .await
            .map_err(|e| EngineError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| EngineError::Internal(format!("response receive failed: {e}")))?
    }

    /// Add a participant and refresh mirrors.
    pub async fn join(&self, participant: String) -> Result<RefreshOutcome, EngineError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(SignupMessage::Join {
                participant,
                respond_to: tx,
            })
            .await
            .map_err(|e| EngineError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| EngineError::Internal(format!("response receive failed: {e}")))?
    }

    /// Remove a participant and refresh mirrors.
    pub async fn leave(&self, participant: String) -> Result<RefreshOutcome, EngineError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(SignupMessage::Leave {
                participant,
                respond_to: tx,
            })
            .await
            .map_err(|e| EngineError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| EngineError::Internal(format!("response receive failed: {e}")))?
    }

    /// Re-push the current snapshot to all mirrors.
    pub async fn resync(&self) -> Result<RefreshOutcome, EngineError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(SignupMessage::Resync { respond_to: tx })
            .await
            .map_err(|e| EngineError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| EngineError::Internal(format!("response receive failed: {e}")))?
    }

    /// Cancel the actor.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }
}

/// Per-sign-up serialization actor.
pub struct SignupActor {
    tenant: String,
    id: String,
    store: Arc<dyn RecordStore>,
    transport: Arc<dyn SurfaceTransport>,
    surface_timeout: Duration,
    receiver: mpsc::Receiver<SignupMessage>,
    cancel_token: CancellationToken,
    metrics: Arc<EngineMetrics>,
}

impl SignupActor {
    /// Spawn an actor for one `(tenant, id)` pair.
    ///
    /// Returns immediately; the actor task runs until cancelled or until
    /// every handle is dropped.
    pub fn spawn(
        tenant: String,
        id: String,
        store: Arc<dyn RecordStore>,
        transport: Arc<dyn SurfaceTransport>,
        config: &EngineConfig,
        cancel_token: CancellationToken,
        metrics: Arc<EngineMetrics>,
    ) -> (SignupActorHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(config.signup_mailbox_buffer);

        let actor = SignupActor {
            tenant: tenant.clone(),
            id: id.clone(),
            store,
            transport,
            surface_timeout: config.surface_timeout(),
            receiver,
            cancel_token: cancel_token.clone(),
            metrics,
        };

        let task = tokio::spawn(actor.run());

        (
            SignupActorHandle {
                sender,
                cancel_token,
                tenant,
                id,
            },
            task,
        )
    }

    async fn run(mut self) {
        debug!(
            target: "muster.actor.signup",
            tenant = %self.tenant,
            signup_id = %self.id,
            "SignupActor started"
        );

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    debug!(
                        target: "muster.actor.signup",
                        tenant = %self.tenant,
                        signup_id = %self.id,
                        "SignupActor received cancellation signal"
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
                            debug!(
                                target: "muster.actor.signup",
                                tenant = %self.tenant,
                                signup_id = %self.id,
                                "SignupActor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn handle_message(&mut self, message: SignupMessage) {
        match message {
            SignupMessage::Create {
                description,
                respond_to,
            } => {
                let result = self.handle_create(description).await;
                let _ = respond_to.send(result);
            }

            SignupMessage::Delete { respond_to } => {
                let result = self.handle_delete().await;
                let _ = respond_to.send(result);
            }

            SignupMessage::AddSurface {
                surface,
                respond_to,
            } => {
                let result = self.handle_add_surface(&surface).await;
                let _ = respond_to.send(result);
            }

            SignupMessage::RemoveSurface {
                surface,
                respond_to,
            } => {
                let result = self.handle_remove_surface(&surface).await;
                let _ = respond_to.send(result);
            }

            SignupMessage::Open { respond_to } => {
                let result = self.handle_open().await;
                let _ = respond_to.send(result);
            }

            SignupMessage::Close { respond_to } => {
                let result = self.handle_close().await;
                let _ = respond_to.send(result);
            }

            SignupMessage::Join {
                participant,
                respond_to,
            } => {
                let result = self.handle_join(&participant).await;
                let _ = respond_to.send(result);
            }

            SignupMessage::Leave {
                participant,
                respond_to,
            } => {
                let result = self.handle_leave(&participant).await;
                let _ = respond_to.send(result);
            }

            SignupMessage::Resync { respond_to } => {
                let result = self.handle_resync().await;
                let _ = respond_to.send(result);
            }
        }
    }

    /// Fetch this sign-up's record, mapping absence to `NotFound`.
    async fn load(&self) -> Result<SignupRecord, EngineError> {
        self.store
            .get(&self.tenant, &self.id)
            .await?
            .ok_or_else(|| EngineError::NotFound(self.id.clone()))
    }

    async fn handle_create(&self, description: String) -> Result<(), EngineError> {
        if self.store.get(&self.tenant, &self.id).await?.is_some() {
            return Err(EngineError::AlreadyExists(self.id.clone()));
        }

        let record = SignupRecord::new(self.id.clone(), description);
        self.store.put(&self.tenant, &self.id, &record).await?;

        info!(
            target: "muster.actor.signup",
            tenant = %self.tenant,
            signup_id = %self.id,
            "Sign-up created"
        );
        Ok(())
    }

    async fn handle_delete(&self) -> Result<(), EngineError> {
        let record = self.load().await?;

        // Open mirrors are abandoned, not torn down.
        if let Some(state) = &record.open_state {
            self.metrics.signup_closed();
            self.metrics.members_discarded(state.members.len());
        }

        self.store.delete(&self.tenant, &self.id).await?;

        info!(
            target: "muster.actor.signup",
            tenant = %self.tenant,
            signup_id = %self.id,
            was_open = record.is_open(),
            "Sign-up deleted"
        );
        Ok(())
    }

    async fn handle_add_surface(&self, surface: &str) -> Result<(), EngineError> {
        let mut record = self.load().await?;

        if record.is_open() {
            return Err(EngineError::InvalidState(
                "surfaces cannot be modified while the sign-up is open".to_string(),
            ));
        }

        if record.add_surface(surface) {
            self.store.put(&self.tenant, &self.id, &record).await?;
        }
        Ok(())
    }

    async fn handle_remove_surface(&self, surface: &str) -> Result<(), EngineError> {
        let mut record = self.load().await?;

        if record.is_open() {
            return Err(EngineError::InvalidState(
                "surfaces cannot be modified while the sign-up is open".to_string(),
            ));
        }

        if !record.remove_surface(surface) {
            return Err(EngineError::NotRegistered(surface.to_string()));
        }

        self.store.put(&self.tenant, &self.id, &record).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(tenant = %self.tenant, signup_id = %self.id))]
    async fn handle_open(&self) -> Result<OpenOutcome, EngineError> {
        let mut record = self.load().await?;

        if record.is_open() {
            return Err(EngineError::InvalidState(
                "sign-up is already open".to_string(),
            ));
        }

        // Post the empty rendering to every registered surface. Surfaces
        // that fail get no mirror entry and see no future updates.
        let text = mirror::render(&record.description, &[]);
        let (mirrors, failed) = mirror::post_to_surfaces(
            self.transport.as_ref(),
            &record.surfaces,
            &text,
            self.surface_timeout,
        )
        .await;

        let mirrored = mirrors.len();
        record.open_state = Some(OpenState {
            members: Vec::new(),
            mirrors,
        });
        self.store.put(&self.tenant, &self.id, &record).await?;

        self.metrics.signup_opened();
        self.metrics.record_mirror_failures(failed);

        if failed > 0 {
            warn!(
                target: "muster.actor.signup",
                mirrored,
                failed,
                "Sign-up opened with delivery failures"
            );
        } else {
            info!(
                target: "muster.actor.signup",
                mirrored,
                "Sign-up opened"
            );
        }

        Ok(OpenOutcome { mirrored, failed })
    }

    async fn handle_close(&self) -> Result<(), EngineError> {
        let mut record = self.load().await?;

        let Some(state) = record.open_state.take() else {
            return Err(EngineError::InvalidState(
                "sign-up is not open".to_string(),
            ));
        };

        // Membership and mirrors are discarded; posted messages are left
        // in place, not retracted.
        self.store.put(&self.tenant, &self.id, &record).await?;

        self.metrics.signup_closed();
        self.metrics.members_discarded(state.members.len());

        info!(
            target: "muster.actor.signup",
            tenant = %self.tenant,
            signup_id = %self.id,
            members_discarded = state.members.len(),
            "Sign-up closed"
        );
        Ok(())
    }

    #[instrument(skip_all, fields(tenant = %self.tenant, signup_id = %self.id))]
    async fn handle_join(&self, participant: &str) -> Result<RefreshOutcome, EngineError> {
        let mut record = self.load().await?;

        let added = {
            let Some(state) = record.open_state.as_mut() else {
                return Err(EngineError::NotFound(self.id.clone()));
            };
            state.add_member(participant)
        };

        if added {
            self.store.put(&self.tenant, &self.id, &record).await?;
            self.metrics.member_joined();
        }

        debug!(
            target: "muster.actor.signup",
            participant = %participant,
            added,
            "Join applied"
        );

        self.refresh(&record).await
    }

    async fn handle_leave(&self, participant: &str) -> Result<RefreshOutcome, EngineError> {
        let mut record = self.load().await?;

        let removed = {
            let Some(state) = record.open_state.as_mut() else {
                return Err(EngineError::NotFound(self.id.clone()));
            };
            state.remove_member(participant)
        };

        if removed {
            self.store.put(&self.tenant, &self.id, &record).await?;
            self.metrics.member_left();
        }

        debug!(
            target: "muster.actor.signup",
            participant = %participant,
            removed,
            "Leave applied"
        );

        self.refresh(&record).await
    }

    async fn handle_resync(&self) -> Result<RefreshOutcome, EngineError> {
        let record = self.load().await?;

        if !record.is_open() {
            return Err(EngineError::InvalidState(
                "sign-up is not open".to_string(),
            ));
        }

        self.refresh(&record).await
    }

    /// Render the current membership and push it to every mirror.
    ///
    /// Membership was persisted before this point; delivery failures only
    /// affect the reported counts.
    async fn refresh(&self, record: &SignupRecord) -> Result<RefreshOutcome, EngineError> {
        let Some(state) = &record.open_state else {
            return Err(EngineError::InvalidState(
                "sign-up is not open".to_string(),
            ));
        };

        let mentions = mirror::resolve_mentions(
            self.transport.as_ref(),
            &state.members,
            self.surface_timeout,
        )
        .await;
        let text = mirror::render(&record.description, &mentions);

        let failed = mirror::update_mirrors(
            self.transport.as_ref(),
            &state.mirrors,
            &text,
            self.surface_timeout,
        )
        .await;

        self.metrics.record_mirror_failures(failed);

        Ok(RefreshOutcome {
            members: state.members.clone(),
            updated: state.mirrors.len().saturating_sub(failed),
            failed,
        })
    }
}
