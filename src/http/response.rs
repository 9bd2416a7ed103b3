//! Job response envelopes and error mapping.
//!
//! # Design Decisions
//! - Rejected jobs (unknown operation, bad input) map to 400
//! - Backend failures after retries map to 502
//! - The envelope shape is the same for success and failure

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::proxy::ProxyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobResponse {
    pub id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobResponse {
    pub fn completed(id: String, output: Value) -> Self {
        Self {
            id,
            status: JobStatus::Completed,
            output: Some(output),
            error: None,
        }
    }

    pub fn failed(id: String, error: &ProxyError) -> Self {
        Self {
            id,
            status: JobStatus::Failed,
            output: None,
            error: Some(error.to_string()),
        }
    }
}

/// HTTP status for a failed job.
pub fn error_status(error: &ProxyError) -> StatusCode {
    if error.is_rejection() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::BAD_GATEWAY
    }
}

/// A failed job, ready to be sent to the caller.
#[derive(Debug)]
pub struct JobFailure {
    pub id: String,
    pub error: ProxyError,
}

impl IntoResponse for JobFailure {
    fn into_response(self) -> Response {
        let status = error_status(&self.error);
        (status, Json(JobResponse::failed(self.id, &self.error))).into_response()
    }
}
