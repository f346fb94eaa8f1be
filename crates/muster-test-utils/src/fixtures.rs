//! Pre-wired fixtures for engine tests.

use crate::mock_transport::MockTransport;
use muster_engine::{EngineConfig, MemoryStore, SignupEngine};
use std::sync::Arc;

/// Build an engine over an in-memory store and a recording mock transport.
///
/// The transport is returned separately so tests can inject failures and
/// assert on deliveries.
#[must_use]
pub fn engine_with_mock() -> (SignupEngine, Arc<MockTransport>) {
    let transport = Arc::new(MockTransport::new());
    let engine = SignupEngine::new(
        Arc::new(MemoryStore::new()),
        transport.clone(),
        EngineConfig::default(),
    );
    (engine, transport)
}

/// Nth test participant reference.
#[must_use]
pub fn participant(n: usize) -> String {
    format!("user-{n}")
}

/// Nth test surface reference.
#[must_use]
pub fn surface(n: usize) -> String {
    format!("channel-{n}")
}
