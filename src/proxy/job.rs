//! Job input and output types.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::proxy::error::ProxyError;
use crate::proxy::stream::TokenStream;
use crate::routing::Operation;

/// The caller-supplied job input. Forwarded verbatim as the backend body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct JobInput(Map<String, Value>);

impl JobInput {
    /// Raw `api_name`, if present and a string.
    pub fn api_name(&self) -> Option<&str> {
        self.0.get("api_name").and_then(Value::as_str)
    }

    /// Resolve `api_name` against the operation table.
    pub fn operation(&self) -> Result<Operation, ProxyError> {
        let name = self.api_name().ok_or(ProxyError::MissingApiName)?;
        name.parse()
            .map_err(|_| ProxyError::UnsupportedOperation(name.to_string()))
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for JobInput {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for JobInput {
    type Error = ProxyError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ProxyError::InvalidInput),
        }
    }
}

/// Result of dispatching one job.
#[derive(Debug)]
pub enum JobOutput {
    /// Parsed backend body.
    Single(Value),
    /// Incremental chunks, ending with [`StreamChunk::Done`](crate::proxy::StreamChunk::Done)
    /// or [`StreamChunk::Failed`](crate::proxy::StreamChunk::Failed).
    Stream(TokenStream),
}
