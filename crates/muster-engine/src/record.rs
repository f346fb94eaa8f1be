//! Persisted sign-up records.
//!
//! The JSON shape of [`SignupRecord`] is the interoperability contract for
//! store backends: any backend must round-trip
//! `{ id, description, surfaces, openState }` losslessly. Field names are
//! camelCase on the wire to match that contract.
//!
//! Membership is kept in first-join order. That order is the total order
//! used for rendering, so repeated renders of the same join history produce
//! identical text.

use serde::{Deserialize, Serialize};

/// A sign-up as stored in the record store.
///
/// `open_state` is present exactly while the sign-up is open. A closed
/// sign-up and a freshly created one have the same storage shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRecord {
    /// Identifier, unique within its tenant.
    pub id: String,
    /// Display text shown at the top of every mirror.
    pub description: String,
    /// Surfaces registered for broadcast. Mutable only while closed.
    #[serde(default)]
    pub surfaces: Vec<String>,
    /// Open-state, present iff the sign-up is open.
    #[serde(default)]
    pub open_state: Option<OpenState>,
}

/// Mutable state of an open sign-up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenState {
    /// Participants in first-join order.
    #[serde(default)]
    pub members: Vec<String>,
    /// Delivery handles for the messages posted when the sign-up opened.
    /// Surfaces that failed the initial post have no entry.
    #[serde(default)]
    pub mirrors: Vec<MirrorEntry>,
}

/// One posted mirror: a surface and the handle used to edit its message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorEntry {
    /// The surface the message was posted to.
    pub surface_ref: String,
    /// Opaque handle locating the posted message for later edits.
    pub delivery_handle: String,
}

impl SignupRecord {
    /// Create a closed sign-up with no registered surfaces.
    #[must_use]
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            surfaces: Vec::new(),
            open_state: None,
        }
    }

    /// Whether the sign-up is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open_state.is_some()
    }

    /// Register a surface. Returns `false` if it was already registered.
    pub fn add_surface(&mut self, surface: &str) -> bool {
        if self.surfaces.iter().any(|s| s == surface) {
            return false;
        }
        self.surfaces.push(surface.to_string());
        true
    }

    /// Unregister a surface. Returns `false` if it was not registered.
    pub fn remove_surface(&mut self, surface: &str) -> bool {
        let before = self.surfaces.len();
        self.surfaces.retain(|s| s != surface);
        self.surfaces.len() != before
    }
}

impl OpenState {
    /// Add a participant, keeping first-join order.
    ///
    /// Returns `false` if the participant was already a member (joining
    /// twice is a no-op, not an error).
    pub fn add_member(&mut self, participant: &str) -> bool {
        if self.members.iter().any(|m| m == participant) {
            return false;
        }
        self.members.push(participant.to_string());
        true
    }

    /// Remove a participant. Removing an absent participant is a no-op;
    /// returns `false` in that case.
    pub fn remove_member(&mut self, participant: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != participant);
        self.members.len() != before
    }
}
