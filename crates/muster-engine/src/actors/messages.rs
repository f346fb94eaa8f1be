//! Message types for actor communication.
//!
//! All inter-actor communication uses strongly-typed message passing via
//! `tokio::sync::mpsc`. Response patterns use `tokio::sync::oneshot` for
//! request-reply semantics.

use crate::errors::EngineError;
use super::signup::SignupActorHandle;
use tokio::sync::oneshot;

/// Messages sent to the `DirectoryActor`.
#[derive(Debug)]
pub enum DirectoryMessage {
    /// Provision a tenant namespace (idempotent).
    CreateTenant {
        tenant: String,
        respond_to: oneshot::Sender<Result<(), EngineError>>,
    },

    /// Destroy a tenant and every sign-up it contains.
    /// The payload reports whether the tenant existed.
    DeleteTenant {
        tenant: String,
        respond_to: oneshot::Sender<Result<bool, EngineError>>,
    },

    /// Destroy and recreate a tenant in one step, tolerating absence.
    ResetTenant {
        tenant: String,
        respond_to: oneshot::Sender<Result<(), EngineError>>,
    },

    /// Summaries of all sign-ups in a tenant.
    ListSignups {
        tenant: String,
        respond_to: oneshot::Sender<Result<Vec<SignupSummary>, EngineError>>,
    },

    /// Resolve the sign-up's serialization actor, spawning it if this is
    /// the first touch of the identifier.
    Signup {
        tenant: String,
        id: String,
        respond_to: oneshot::Sender<SignupActorHandle>,
    },
}

/// Messages sent to a per-sign-up `SignupActor`.
///
/// The actor processes these one at a time, which is what serializes
/// concurrent mutations on one sign-up.
#[derive(Debug)]
pub enum SignupMessage {
    /// Create the sign-up record (state: created).
    Create {
        description: String,
        respond_to: oneshot::Sender<Result<(), EngineError>>,
    },

    /// Remove the record unconditionally, whatever its state.
    Delete {
        respond_to: oneshot::Sender<Result<(), EngineError>>,
    },

    /// Register a surface for broadcast (closed sign-ups only).
    AddSurface {
        surface: String,
        respond_to: oneshot::Sender<Result<(), EngineError>>,
    },

    /// Unregister a surface (closed sign-ups only).
    RemoveSurface {
        surface: String,
        respond_to: oneshot::Sender<Result<(), EngineError>>,
    },

    /// Open the sign-up and post initial mirrors to every surface.
    Open {
        respond_to: oneshot::Sender<Result<OpenOutcome, EngineError>>,
    },

    /// Close the sign-up, discarding members and mirrors.
    Close {
        respond_to: oneshot::Sender<Result<(), EngineError>>,
    },

    /// Add a participant and refresh all mirrors.
    Join {
        participant: String,
        respond_to: oneshot::Sender<Result<RefreshOutcome, EngineError>>,
    },

    /// Remove a participant and refresh all mirrors.
    Leave {
        participant: String,
        respond_to: oneshot::Sender<Result<RefreshOutcome, EngineError>>,
    },

    /// Re-push the current snapshot to all mirrors (e.g. after restart).
    Resync {
        respond_to: oneshot::Sender<Result<RefreshOutcome, EngineError>>,
    },
}

/// Result of opening a sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOutcome {
    /// Surfaces that received the initial post and will be updated.
    pub mirrored: usize,
    /// Partial-failure count: surfaces that did not accept the post.
    pub failed: usize,
}

impl OpenOutcome {
    /// Whether every registered surface received its mirror.
    #[must_use]
    pub fn is_full_success(&self) -> bool {
        self.failed == 0
    }
}

/// Result of a membership mutation or resync, reflecting post-mutation
/// state so callers can answer with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Membership snapshot after the mutation, in first-join order.
    pub members: Vec<String>,
    /// Mirrors successfully updated with the new snapshot.
    pub updated: usize,
    /// Partial-failure count for this refresh.
    pub failed: usize,
}

/// One row of a tenant's sign-up listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupSummary {
    pub id: String,
    pub surface_count: usize,
    pub is_open: bool,
}
