//! Engine error types.
//!
//! Every operation on the command surface returns one of these as an
//! explicit result value. Per-surface delivery failures are never errors;
//! they are aggregated into counts on otherwise-successful outcomes.
//! Front-ends are responsible for turning error kinds into user-facing
//! text; [`EngineError::kind`] gives them a stable discriminant.

use crate::store::StoreError;
use thiserror::Error;

/// Sign-up engine error type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Tenant or sign-up id unknown.
    #[error("not found: {0}")]
    NotFound(String),

    /// Create was issued for an id that already has a record.
    #[error("sign-up already exists: {0}")]
    AlreadyExists(String),

    /// Operation is illegal for the current lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Removing a surface that is not registered.
    #[error("surface not registered: {0}")]
    NotRegistered(String),

    /// The persistence layer itself is unreachable. Fatal to the calling
    /// operation; never retried by the engine.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Actor plumbing failure (mailbox closed, response dropped).
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Stable discriminant for front-end rendering and log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::NotFound(_) => "not_found",
            EngineError::AlreadyExists(_) => "already_exists",
            EngineError::InvalidState(_) => "invalid_state",
            EngineError::NotRegistered(_) => "not_registered",
            EngineError::StoreUnavailable(_) => "store_unavailable",
            EngineError::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::TenantNotFound(tenant) => EngineError::NotFound(tenant),
            StoreError::Unavailable(message) => EngineError::StoreUnavailable(message),
        }
    }
}
