//! Retry logic.
//!
//! # Responsibilities
//! - Decide whether a backend outcome is retryable
//! - Produce the backoff delay for each retry
//! - Enforce the retry budget (retries counted after the first call)
//!
//! # Design Decisions
//! - Applies to every verb: the backend only ever answers forcelisted
//!   statuses before it has started work on a job
//! - Connection failures are retryable; timeouts and read errors are not
//! - Application-level validation never reaches this layer

use std::time::Duration;

use reqwest::StatusCode;

use crate::config::RetryConfig;
use crate::resilience::backoff::calculate_backoff;

/// Transport retry policy, fixed at client construction.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_factor_ms: u64,
    max_backoff_ms: u64,
    status_forcelist: Vec<StatusCode>,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_factor_ms: config.backoff_factor_ms,
            max_backoff_ms: config.max_backoff_ms,
            status_forcelist: config
                .status_forcelist
                .iter()
                .filter_map(|s| StatusCode::from_u16(*s).ok())
                .collect(),
        }
    }

    /// Retries allowed after the first call.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn is_retryable_status(&self, status: StatusCode) -> bool {
        self.status_forcelist.contains(&status)
    }

    pub fn is_retryable_error(&self, err: &reqwest::Error) -> bool {
        err.is_connect()
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based).
    pub fn can_retry(&self, attempt: u32) -> bool {
        attempt <= self.max_retries
    }

    /// Delay before the retry that follows attempt number `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.backoff_factor_ms, self.max_backoff_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}
