//! Engine configuration.
//!
//! Configuration is loaded from environment variables with sensible
//! defaults; `from_vars` takes a plain map so tests never touch the
//! process environment.

use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default per-surface delivery timeout in seconds. A post or update that
/// has not completed by then counts as a failure for that surface only.
pub const DEFAULT_SURFACE_TIMEOUT_SECONDS: u64 = 10;

/// Default mailbox buffer for per-sign-up actors.
pub const DEFAULT_SIGNUP_MAILBOX_BUFFER: usize = 64;

/// Default mailbox buffer for the directory actor.
pub const DEFAULT_DIRECTORY_MAILBOX_BUFFER: usize = 256;

/// Sign-up engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Per-surface delivery timeout in seconds (default: 10).
    pub surface_timeout_seconds: u64,

    /// Mailbox buffer size for per-sign-up actors (default: 64).
    pub signup_mailbox_buffer: usize,

    /// Mailbox buffer size for the directory actor (default: 256).
    pub directory_mailbox_buffer: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            surface_timeout_seconds: DEFAULT_SURFACE_TIMEOUT_SECONDS,
            signup_mailbox_buffer: DEFAULT_SIGNUP_MAILBOX_BUFFER,
            directory_mailbox_buffer: DEFAULT_DIRECTORY_MAILBOX_BUFFER,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let surface_timeout_seconds = parse_var(
            vars,
            "MUSTER_SURFACE_TIMEOUT_SECONDS",
            DEFAULT_SURFACE_TIMEOUT_SECONDS,
        )?;

        let signup_mailbox_buffer = parse_var(
            vars,
            "MUSTER_SIGNUP_MAILBOX_BUFFER",
            DEFAULT_SIGNUP_MAILBOX_BUFFER,
        )?;

        let directory_mailbox_buffer = parse_var(
            vars,
            "MUSTER_DIRECTORY_MAILBOX_BUFFER",
            DEFAULT_DIRECTORY_MAILBOX_BUFFER,
        )?;

        Ok(EngineConfig {
            surface_timeout_seconds,
            signup_mailbox_buffer,
            directory_mailbox_buffer,
        })
    }

    /// Per-surface delivery timeout as a [`Duration`].
    #[must_use]
    pub fn surface_timeout(&self) -> Duration {
        Duration::from_secs(self.surface_timeout_seconds)
    }
}

fn parse_var<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.clone(),
        }),
    }
}
