//! Actor model implementation for the sign-up engine.
//!
//! ```text
//! DirectoryActor (singleton per engine)
//! └── supervises N SignupActors
//!     └── SignupActor (one per touched (tenant, id) pair)
//!         └── serializes create/open/close/join/leave/resync
//! ```
//!
//! # Key Design Decisions
//!
//! - **One actor per sign-up identifier**: the mailbox is the exclusion
//!   domain; operations on different sign-ups never block each other
//! - **Actors are stateless serialization points**: every operation
//!   re-reads the record store, so actor lifetime is independent of
//!   record lifetime
//! - **CancellationToken propagation**: the directory passes child tokens
//!   to sign-up actors for shutdown
//! - **Message passing**: all inter-actor communication via
//!   `tokio::sync::mpsc` channels with `oneshot` replies
//!
//! # Modules
//!
//! - [`directory`] - `DirectoryActor` singleton that supervises sign-ups
//! - [`signup`] - `SignupActor` per sign-up identifier
//! - [`messages`] - Message types for actor communication
//! - [`metrics`] - Engine counters

pub mod directory;
pub mod messages;
pub mod metrics;
pub mod signup;

// Re-export primary types
pub use directory::DirectoryActorHandle;
pub use messages::{OpenOutcome, RefreshOutcome, SignupSummary};
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use signup::{SignupActor, SignupActorHandle};
