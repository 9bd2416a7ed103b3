//! Errors raised while talking to the backend.

use reqwest::StatusCode;
use thiserror::Error;

use crate::routing::Operation;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid backend base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("backend request for '{operation}' failed: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },

    #[error("backend answered {status} for '{operation}' on all {attempts} attempts")]
    RetriesExhausted {
        operation: Operation,
        status: StatusCode,
        attempts: u32,
    },
}
