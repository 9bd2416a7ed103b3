//! Errors surfaced to the caller of a job.

use reqwest::StatusCode;
use thiserror::Error;

use crate::backend::BackendError;
use crate::routing::Operation;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("unsupported operation '{0}'")]
    UnsupportedOperation(String),

    #[error("job input is missing a string 'api_name' field")]
    MissingApiName,

    #[error("job input must be a JSON object")]
    InvalidInput,

    #[error("operation '{0}' streams its output; submit it to /stream")]
    StreamingRequiresStreamEndpoint(Operation),

    #[error("backend returned a non-JSON body for '{operation}': {source}")]
    InvalidResponse {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },

    #[error("backend refused streaming call '{operation}' with {status}: {body}")]
    StreamRefused {
        operation: Operation,
        status: StatusCode,
        body: String,
    },

    #[error("backend stream broke off: {0}")]
    StreamInterrupted(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ProxyError {
    /// Whether the job was rejected before the backend was contacted.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ProxyError::UnsupportedOperation(_)
                | ProxyError::MissingApiName
                | ProxyError::InvalidInput
                | ProxyError::StreamingRequiresStreamEndpoint(_)
        )
    }
}
