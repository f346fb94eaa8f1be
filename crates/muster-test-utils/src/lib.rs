//! # Muster Test Utilities
//!
//! Shared test utilities for the sign-up engine.
//!
//! Provides mock implementations and fixtures for isolated engine testing
//! without a real messaging transport.
//!
//! ## Modules
//!
//! - `mock_transport` - Recording in-memory surface transport with
//!   configurable per-surface failures
//! - `fixtures` - Pre-wired engine instances and id helpers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use muster_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let (engine, transport) = fixtures::engine_with_mock();
//!     transport.fail_surface("flaky-channel");
//!
//!     engine.create_tenant("guild-1").await.unwrap();
//!     // Run your test...
//! }
//! ```

pub mod fixtures;
pub mod mock_transport;

pub use mock_transport::{MockTransport, PostedMessage, UpdatedMessage};
