//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the worker.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the worker.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WorkerConfig {
    /// Job API listener configuration.
    pub listener: ListenerConfig,

    /// Local generation backend.
    pub backend: BackendConfig,

    /// Startup readiness gate.
    pub readiness: ReadinessConfig,

    /// Transport retry policy.
    pub retries: RetryConfig,

    /// Streaming delivery settings.
    pub streaming: StreamingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Backend configuration. The base URL is fixed for the process lifetime.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the KoboldCpp-compatible service.
    pub base_url: String,

    /// Overall per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5001".to_string(),
            request_timeout_secs: 600,
            connect_timeout_secs: 10,
        }
    }
}

/// Readiness gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Path probed until the backend answers.
    pub path: String,

    /// Delay between failed probes in milliseconds.
    pub interval_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            path: "/api/v1/generate".to_string(),
            interval_ms: 200,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries allowed after the first call (10 means up to 11 calls).
    pub max_retries: u32,

    /// Backoff factor in milliseconds (delay = factor * 2^(retry - 1)).
    pub backoff_factor_ms: u64,

    /// Upper bound for a single backoff delay in milliseconds.
    pub max_backoff_ms: u64,

    /// Backend statuses that trigger a retry.
    pub status_forcelist: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            backoff_factor_ms: 100,
            max_backoff_ms: 120_000,
            status_forcelist: vec![502, 503, 504],
        }
    }
}

/// Streaming delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Aggregate streamed chunks into a single `/runsync` result.
    ///
    /// Legacy behaviour; `/stream` always delivers incrementally.
    pub aggregate: bool,

    /// Capacity of the per-job chunk channel.
    pub channel_capacity: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            aggregate: false,
            channel_capacity: 64,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
