//! Job request envelope.
//!
//! # Responsibilities
//! - Deserialize `{"id"?, "input": {...}}` bodies
//! - Assign a job ID (UUID v4) when the caller sends none
//! - Derive a low-cardinality operation label for metrics

use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::routing::Operation;

/// Body accepted by `/runsync` and `/stream`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub input: Value,
}

impl JobRequest {
    /// Caller-provided job ID, or a fresh UUID.
    pub fn job_id(&self) -> String {
        match &self.id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => Uuid::new_v4().to_string(),
        }
    }

    /// The api_name as a metrics label; unknown names collapse to one value.
    pub fn operation_label(&self) -> &'static str {
        self.input
            .get("api_name")
            .and_then(Value::as_str)
            .and_then(|name| name.parse::<Operation>().ok())
            .map(Operation::api_name)
            .unwrap_or("unsupported")
    }

    pub fn api_name(&self) -> &str {
        self.input
            .get("api_name")
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}
