//! Timeout enforcement.
//!
//! # Responsibilities
//! - Turn configured seconds into the deadlines handed to the HTTP client
//! - Bound every backend call, streaming included
//!
//! # Design Decisions
//! - Enforced by reqwest, not by wrapping futures
//! - Timeouts are never retried: a generation that ran for the full
//!   deadline would simply run again

use std::time::Duration;

use crate::config::BackendConfig;

/// Deadlines applied to backend calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Timeouts {
    pub fn from_config(config: &BackendConfig) -> Self {
        Self {
            connect: Duration::from_secs(config.connect_timeout_secs),
            request: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::from_config(&BackendConfig::default())
    }
}
