//! Broadcast mirror: rendering and surface fan-out.
//!
//! A mirror is the live rendering of a sign-up's membership on one surface.
//! Delivery is best-effort per surface: a post or update that fails (or
//! times out) is counted and logged, never escalated to a component error.
//! Membership state in the store is the source of truth; mirrors are
//! projections of it.

use crate::record::MirrorEntry;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Surface delivery failure. Always soft: the caller counts it and moves
/// on to the next surface.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The surface rejected or could not complete the delivery.
    #[error("delivery failed: {0}")]
    Failed(String),
}

/// Capability interface to the external messaging transport.
///
/// The engine treats surfaces as opaque targets hosting one editable posted
/// message each. Handles returned by [`post`](SurfaceTransport::post) are
/// opaque; the engine only stores them and passes them back to
/// [`update`](SurfaceTransport::update).
#[async_trait::async_trait]
pub trait SurfaceTransport: Send + Sync {
    /// Create a new message on a surface, returning the delivery handle
    /// used to edit it later.
    async fn post(&self, surface: &str, text: &str) -> Result<String, TransportError>;

    /// Edit a previously posted message in place.
    async fn update(&self, handle: &str, text: &str) -> Result<(), TransportError>;

    /// Resolve a participant reference to a human-displayable mention.
    async fn mention(&self, participant: &str) -> Result<String, TransportError>;
}

/// Render the status text for a membership snapshot.
///
/// Deterministic: the same description and member list always produce the
/// same text. Callers pass members in first-join order, so renders are
/// reproducible for a given join history.
#[must_use]
pub fn render(description: &str, members: &[String]) -> String {
    if members.is_empty() {
        return format!("{description}\nBe the first to sign up!");
    }

    let mut out = format!("{description}\nSigned up:");
    for member in members {
        out.push_str("\n* ");
        out.push_str(member);
    }
    out
}

/// Resolve participant references to display mentions.
///
/// A reference the transport cannot resolve (error or timeout) falls back
/// to the raw reference; resolution failures never block a refresh.
pub(crate) async fn resolve_mentions(
    transport: &dyn SurfaceTransport,
    participants: &[String],
    timeout: Duration,
) -> Vec<String> {
    let mut mentions = Vec::with_capacity(participants.len());
    for participant in participants {
        let resolved = tokio::time::timeout(timeout, transport.mention(participant)).await;
        match resolved {
            Ok(Ok(mention)) => mentions.push(mention),
            Ok(Err(e)) => {
                warn!(
                    target: "muster.mirror",
                    participant = %participant,
                    error = %e,
                    "Mention resolution failed, using raw reference"
                );
                mentions.push(participant.clone());
            }
            Err(_) => {
                warn!(
                    target: "muster.mirror",
                    participant = %participant,
                    "Mention resolution timed out, using raw reference"
                );
                mentions.push(participant.clone());
            }
        }
    }
    mentions
}

/// Post the initial rendering to every registered surface.
///
/// Returns the mirrors that were created and the number of surfaces that
/// failed. Failed surfaces get no mirror entry and are absent from all
/// future updates.
pub(crate) async fn post_to_surfaces(
    transport: &dyn SurfaceTransport,
    surfaces: &[String],
    text: &str,
    timeout: Duration,
) -> (Vec<MirrorEntry>, usize) {
    let mut mirrors = Vec::with_capacity(surfaces.len());
    let mut failed = 0;

    for surface in surfaces {
        let posted = tokio::time::timeout(timeout, transport.post(surface, text)).await;
        match posted {
            Ok(Ok(handle)) => {
                debug!(
                    target: "muster.mirror",
                    surface = %surface,
                    "Posted mirror"
                );
                mirrors.push(MirrorEntry {
                    surface_ref: surface.clone(),
                    delivery_handle: handle,
                });
            }
            Ok(Err(e)) => {
                warn!(
                    target: "muster.mirror",
                    surface = %surface,
                    error = %e,
                    "Mirror post failed"
                );
                failed += 1;
            }
            Err(_) => {
                warn!(
                    target: "muster.mirror",
                    surface = %surface,
                    "Mirror post timed out"
                );
                failed += 1;
            }
        }
    }

    (mirrors, failed)
}

/// Push the current rendering to every existing mirror.
///
/// Returns the number of mirrors that failed to update. Each surface's own
/// message ends up no older than the mutation that triggered the push; no
/// ordering is guaranteed between surfaces.
pub(crate) async fn update_mirrors(
    transport: &dyn SurfaceTransport,
    mirrors: &[MirrorEntry],
    text: &str,
    timeout: Duration,
) -> usize {
    let mut failed = 0;

    for mirror in mirrors {
        let updated =
            tokio::time::timeout(timeout, transport.update(&mirror.delivery_handle, text)).await;
        match updated {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(
                    target: "muster.mirror",
                    surface = %mirror.surface_ref,
                    error = %e,
                    "Mirror update failed"
                );
                failed += 1;
            }
            Err(_) => {
                warn!(
                    target: "muster.mirror",
                    surface = %mirror.surface_ref,
                    "Mirror update timed out"
                );
                failed += 1;
            }
        }
    }

    failed
}
