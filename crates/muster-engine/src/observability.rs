//! Observability helpers.
//!
//! The engine emits structured `tracing` events under the `muster.*`
//! targets (`muster.actor.directory`, `muster.actor.signup`,
//! `muster.mirror`, `muster.store.redis`). Embedding front-ends call
//! [`init_tracing`] once at startup for formatted output with
//! `RUST_LOG`-style filtering; hosts with their own subscriber setup can
//! skip it entirely.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a formatting subscriber as the global default.
///
/// Respects `RUST_LOG`; falls back to `muster_engine=debug` when the
/// variable is unset or unparseable.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing() -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "muster_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
