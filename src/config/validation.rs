//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, status codes sane)
//! - Check addresses and the backend URL parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: WorkerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::WorkerConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration, collecting every error found.
pub fn validate_config(config: &WorkerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    match Url::parse(&config.backend.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "backend.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("backend.base_url", e.to_string())),
    }

    if config.backend.request_timeout_secs == 0 {
        errors.push(ValidationError::new("backend.request_timeout_secs", "must be > 0"));
    }
    if config.backend.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("backend.connect_timeout_secs", "must be > 0"));
    }

    if !config.readiness.path.starts_with('/') {
        errors.push(ValidationError::new("readiness.path", "must start with '/'"));
    }
    if config.readiness.interval_ms == 0 {
        errors.push(ValidationError::new("readiness.interval_ms", "must be > 0"));
    }

    for status in &config.retries.status_forcelist {
        if !(400..=599).contains(status) {
            errors.push(ValidationError::new(
                "retries.status_forcelist",
                format!("{} is not a 4xx/5xx status", status),
            ));
        }
    }

    if config.streaming.channel_capacity == 0 {
        errors.push(ValidationError::new("streaming.channel_capacity", "must be >= 1"));
    }

    let obs = &config.observability;
    if obs.log_format != "pretty" && obs.log_format != "json" {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("expected 'pretty' or 'json', got '{}'", obs.log_format),
        ));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", obs.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
