//! Job dispatch: one job in, one backend call out.

use std::sync::Arc;

use futures_util::StreamExt;
use reqwest::Response;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::Instrument;

use crate::backend::{BackendClient, BackendError};
use crate::proxy::error::ProxyError;
use crate::proxy::job::{JobInput, JobOutput};
use crate::proxy::sse::{parse_event_line, LineDecoder};
use crate::proxy::stream::{StreamChunk, TokenStream};
use crate::routing::{Operation, Verb};

/// Translates jobs into backend calls.
#[derive(Debug, Clone)]
pub struct RequestProxy {
    client: Arc<BackendClient>,
    channel_capacity: usize,
}

impl RequestProxy {
    pub fn new(client: Arc<BackendClient>, channel_capacity: usize) -> Self {
        Self {
            client,
            channel_capacity,
        }
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    /// Dispatch one job.
    ///
    /// Unknown operations fail before any network activity. Streaming
    /// operations return as soon as the backend has answered; chunks are then
    /// produced in the background until the backend closes the connection.
    /// A streaming call the backend answers with an error status fails here.
    pub async fn dispatch(&self, input: JobInput) -> Result<JobOutput, ProxyError> {
        let operation = input.operation()?;
        tracing::debug!(operation = %operation, "Dispatching job");

        match operation.verb() {
            Verb::Get => {
                let response = self.client.send::<JobInput>(operation, None).await?;
                Ok(JobOutput::Single(read_json(operation, response).await?))
            }
            Verb::Post if operation.is_streaming() => {
                let response = self.client.send(operation, Some(&input)).await?;
                if !response.status().is_success() {
                    return Err(refused_stream(operation, response).await);
                }
                Ok(JobOutput::Stream(self.spawn_stream(operation, response)))
            }
            Verb::Post => {
                let response = self.client.send(operation, Some(&input)).await?;
                Ok(JobOutput::Single(read_json(operation, response).await?))
            }
        }
    }

    fn spawn_stream(&self, operation: Operation, response: Response) -> TokenStream {
        let (tx, stream) = TokenStream::channel(self.channel_capacity);
        tokio::spawn(pump_events(operation, response, tx).in_current_span());
        stream
    }
}

/// Read the event stream line by line, forwarding chunks until the backend
/// closes the connection, then send the terminal marker. A read error ends
/// the stream with [`StreamChunk::Failed`] instead of [`StreamChunk::Done`].
async fn pump_events(operation: Operation, response: Response, tx: mpsc::Sender<StreamChunk>) {
    let mut decoder = LineDecoder::new();
    let mut body = response.bytes_stream();
    let mut forwarded = 0usize;

    while let Some(next) = body.next().await {
        let bytes = match next {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(operation = %operation, error = %e, chunks = forwarded, "Backend stream interrupted");
                let _ = tx
                    .send(StreamChunk::Failed {
                        message: e.to_string(),
                    })
                    .await;
                return;
            }
        };
        for line in decoder.push(&bytes) {
            if let Some(chunk) = parse_event_line(&line) {
                if tx.send(chunk).await.is_err() {
                    tracing::debug!(operation = %operation, "Stream consumer went away");
                    return;
                }
                forwarded += 1;
            }
        }
    }

    if let Some(chunk) = decoder.finish().as_deref().and_then(parse_event_line) {
        if tx.send(chunk).await.is_err() {
            return;
        }
        forwarded += 1;
    }

    tracing::debug!(operation = %operation, chunks = forwarded, "Backend stream closed");
    let _ = tx.send(StreamChunk::Done).await;
}

/// Turn a non-2xx answer to a streaming call into a job error carrying the
/// backend's body.
async fn refused_stream(operation: Operation, response: Response) -> ProxyError {
    let status = response.status();
    tracing::warn!(operation = %operation, status = %status, "Backend refused streaming call");

    match response.text().await {
        Ok(body) => ProxyError::StreamRefused {
            operation,
            status,
            body: body.trim().to_string(),
        },
        Err(source) => BackendError::Transport { operation, source }.into(),
    }
}

async fn read_json(operation: Operation, response: Response) -> Result<Value, ProxyError> {
    let status = response.status();
    if !status.is_success() {
        tracing::warn!(operation = %operation, status = %status, "Backend returned non-success status");
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|source| BackendError::Transport { operation, source })?;

    serde_json::from_slice(&bytes).map_err(|source| ProxyError::InvalidResponse { operation, source })
}
