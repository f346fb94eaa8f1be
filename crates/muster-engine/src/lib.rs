//! Muster Sign-up Coordination Engine
//!
//! This library coordinates group sign-ups: a named event accepts a
//! mutable set of participants and is mirrored as live status text across
//! multiple external notification surfaces. Responsibilities:
//!
//! - Persisted lifecycle state machine per sign-up (created, open, closed)
//! - Serialized join/leave mutations with no lost updates
//! - Best-effort multi-surface broadcast with idempotent resync
//! - Tenant isolation (independent sign-up namespaces per tenant)
//!
//! # Architecture
//!
//! The engine uses an actor hierarchy:
//!
//! ```text
//! SignupEngine (facade, the command surface)
//! └── DirectoryActor (singleton)
//!     └── supervises N SignupActors (one per (tenant, id))
//!         └── serializes all mutations for its sign-up
//! ```
//!
//! # Key Design Decisions
//!
//! - **Store is the source of truth**: mirrors are best-effort projections;
//!   a surface failure never rolls back a membership mutation
//! - **Exclusion per identifier**: one mailbox per `(tenant, id)` pair;
//!   unrelated sign-ups never contend
//! - **Soft delivery failures**: per-surface post/update failures are
//!   counted and reported, never escalated to operation errors
//!
//! # Modules
//!
//! - [`engine`] - `SignupEngine` command surface
//! - [`actors`] - actor model implementation
//! - [`mirror`] - rendering and surface fan-out
//! - [`store`] - record store trait and backends
//! - [`record`] - persisted record shapes
//! - [`config`] - engine configuration from environment
//! - [`errors`] - error types
//! - [`observability`] - tracing subscriber setup for embedders

pub mod actors;
pub mod config;
pub mod engine;
pub mod errors;
pub mod mirror;
pub mod observability;
pub mod record;
pub mod store;

pub use actors::{OpenOutcome, RefreshOutcome, SignupSummary};
pub use config::EngineConfig;
pub use engine::SignupEngine;
pub use errors::EngineError;
pub use mirror::{render, SurfaceTransport, TransportError};
pub use record::{MirrorEntry, OpenState, SignupRecord};
pub use store::{MemoryStore, RecordStore, RedisStore, StoreError};
