//! Recording in-memory surface transport.
//!
//! Every post and update is recorded for assertions. Individual surfaces,
//! handles and participants can be made to fail, which is how tests
//! exercise the engine's partial-failure paths.

use muster_engine::{SurfaceTransport, TransportError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A message created via [`SurfaceTransport::post`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub surface: String,
    pub handle: String,
    pub text: String,
}

/// An edit applied via [`SurfaceTransport::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatedMessage {
    pub handle: String,
    pub text: String,
}

#[derive(Default)]
struct MockState {
    posts: Vec<PostedMessage>,
    updates: Vec<UpdatedMessage>,
    failing_surfaces: HashSet<String>,
    failing_handles: HashSet<String>,
    hanging_surfaces: HashSet<String>,
    hanging_handles: HashSet<String>,
    unresolvable: HashSet<String>,
    mentions: HashMap<String, String>,
}

/// Mock surface transport for engine tests.
///
/// Handles are unique for the lifetime of the mock (`{surface}/msg-{n}`),
/// so a close/reopen cycle observably produces fresh handles.
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
    next_handle: AtomicUsize,
}

impl MockTransport {
    /// Create a mock where every delivery succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future post to `surface` fail.
    pub fn fail_surface(&self, surface: &str) {
        self.lock().failing_surfaces.insert(surface.to_string());
    }

    /// Let posts to `surface` succeed again.
    pub fn restore_surface(&self, surface: &str) {
        self.lock().failing_surfaces.remove(surface);
    }

    /// Make every future update of `handle` fail.
    pub fn fail_handle(&self, handle: &str) {
        self.lock().failing_handles.insert(handle.to_string());
    }

    /// Make every future post to `surface` hang forever, so callers can
    /// only get out via their own delivery timeout.
    pub fn hang_surface(&self, surface: &str) {
        self.lock().hanging_surfaces.insert(surface.to_string());
    }

    /// Make every future update of `handle` hang forever.
    pub fn hang_handle(&self, handle: &str) {
        self.lock().hanging_handles.insert(handle.to_string());
    }

    /// Make mention resolution fail for `participant`.
    pub fn fail_mention(&self, participant: &str) {
        self.lock().unresolvable.insert(participant.to_string());
    }

    /// Override the mention returned for `participant`
    /// (default: `@{participant}`).
    pub fn set_mention(&self, participant: &str, mention: &str) {
        self.lock()
            .mentions
            .insert(participant.to_string(), mention.to_string());
    }

    /// All recorded posts, in delivery order.
    #[must_use]
    pub fn posts(&self) -> Vec<PostedMessage> {
        self.lock().posts.clone()
    }

    /// All recorded updates, in delivery order.
    #[must_use]
    pub fn updates(&self) -> Vec<UpdatedMessage> {
        self.lock().updates.clone()
    }

    /// Updates applied to one handle, in delivery order.
    #[must_use]
    pub fn updates_for(&self, handle: &str) -> Vec<UpdatedMessage> {
        self.lock()
            .updates
            .iter()
            .filter(|u| u.handle == handle)
            .cloned()
            .collect()
    }

    /// Handles of messages posted to one surface, in delivery order.
    #[must_use]
    pub fn handles_for(&self, surface: &str) -> Vec<String> {
        self.lock()
            .posts
            .iter()
            .filter(|p| p.surface == surface)
            .map(|p| p.handle.clone())
            .collect()
    }

    /// Number of posts recorded so far.
    #[must_use]
    pub fn post_count(&self) -> usize {
        self.lock().posts.len()
    }

    /// Number of updates recorded so far.
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.lock().updates.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait::async_trait]
impl SurfaceTransport for MockTransport {
    async fn post(&self, surface: &str, text: &str) -> Result<String, TransportError> {
        let hanging = self.lock().hanging_surfaces.contains(surface);
        if hanging {
            std::future::pending::<()>().await;
        }

        let n = self.next_handle.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();

        if state.failing_surfaces.contains(surface) {
            return Err(TransportError::Failed(format!(
                "surface {surface} rejected the post"
            )));
        }

        let handle = format!("{surface}/msg-{n}");
        state.posts.push(PostedMessage {
            surface: surface.to_string(),
            handle: handle.clone(),
            text: text.to_string(),
        });
        Ok(handle)
    }

    async fn update(&self, handle: &str, text: &str) -> Result<(), TransportError> {
        let hanging = self.lock().hanging_handles.contains(handle);
        if hanging {
            std::future::pending::<()>().await;
        }

        let mut state = self.lock();

        if state.failing_handles.contains(handle) {
            return Err(TransportError::Failed(format!(
                "handle {handle} cannot be edited"
            )));
        }

        state.updates.push(UpdatedMessage {
            handle: handle.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn mention(&self, participant: &str) -> Result<String, TransportError> {
        let state = self.lock();

        if state.unresolvable.contains(participant) {
            return Err(TransportError::Failed(format!(
                "participant {participant} is unknown"
            )));
        }

        Ok(state
            .mentions
            .get(participant)
            .cloned()
            .unwrap_or_else(|| format!("@{participant}")))
    }
}
