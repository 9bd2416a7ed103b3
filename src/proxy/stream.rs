//! Streamed job output.
//!
//! A producer task pushes chunks into a bounded channel as they arrive from
//! the backend; the consumer pulls them through [`TokenStream`]. The last
//! chunk is always terminal: [`StreamChunk::Done`] when the backend closed
//! the stream, [`StreamChunk::Failed`] when reading it broke off.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};
use tokio::sync::mpsc;

pub const DECODE_FAILURE_MARKER: &str = "Error decoding JSON";
pub const DONE_MARKER: &str = "[DONE]";
pub const FAILED_MARKER: &str = "[ERROR]";

/// SSE event names for marker chunks. Tokens use the default event.
pub const DECODE_FAILURE_EVENT: &str = "decode_error";
pub const DONE_EVENT: &str = "done";
pub const FAILED_EVENT: &str = "error";

/// One unit of streamed output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    Token(String),
    /// A `data:` line whose payload could not be decoded.
    DecodeFailure { raw: String },
    Done,
    /// The backend stream broke off; output before it is incomplete.
    Failed { message: String },
}

impl StreamChunk {
    /// Text sent to callers for this chunk.
    ///
    /// A token whose text equals one of the markers looks the same here.
    /// Callers that must tell them apart use [`event_name`](Self::event_name).
    pub fn as_wire(&self) -> &str {
        match self {
            StreamChunk::Token(token) => token,
            StreamChunk::DecodeFailure { .. } => DECODE_FAILURE_MARKER,
            StreamChunk::Done => DONE_MARKER,
            StreamChunk::Failed { .. } => FAILED_MARKER,
        }
    }

    /// SSE event name, `None` for tokens.
    pub fn event_name(&self) -> Option<&'static str> {
        match self {
            StreamChunk::Token(_) => None,
            StreamChunk::DecodeFailure { .. } => Some(DECODE_FAILURE_EVENT),
            StreamChunk::Done => Some(DONE_EVENT),
            StreamChunk::Failed { .. } => Some(FAILED_EVENT),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, StreamChunk::Done)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamChunk::Done | StreamChunk::Failed { .. })
    }
}

impl Serialize for StreamChunk {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

/// Receiving half of a job's chunk channel.
#[derive(Debug)]
pub struct TokenStream {
    rx: mpsc::Receiver<StreamChunk>,
}

impl TokenStream {
    /// Create a linked sender/stream pair.
    pub fn channel(capacity: usize) -> (mpsc::Sender<StreamChunk>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self { rx })
    }

    pub async fn next_chunk(&mut self) -> Option<StreamChunk> {
        self.rx.recv().await
    }

    /// Drain the stream, terminal marker included.
    pub async fn collect_chunks(mut self) -> Vec<StreamChunk> {
        let mut chunks = Vec::new();
        while let Some(chunk) = self.rx.recv().await {
            chunks.push(chunk);
        }
        chunks
    }

    /// Drain the stream into a single result (legacy `/runsync` shape).
    pub async fn aggregate(self) -> AggregatedStream {
        let chunks = self.collect_chunks().await;
        let text = chunks
            .iter()
            .filter_map(|chunk| match chunk {
                StreamChunk::Token(token) => Some(token.as_str()),
                _ => None,
            })
            .collect();
        AggregatedStream { text, chunks }
    }
}

impl Stream for TokenStream {
    type Item = StreamChunk;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

/// A fully drained stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedStream {
    /// Concatenated tokens.
    pub text: String,
    pub chunks: Vec<StreamChunk>,
}

impl AggregatedStream {
    /// Why the stream broke off, if it did.
    pub fn failure(&self) -> Option<&str> {
        match self.chunks.last() {
            Some(StreamChunk::Failed { message }) => Some(message),
            _ => None,
        }
    }

    pub fn into_json(self) -> Value {
        let chunks: Vec<Value> = self
            .chunks
            .iter()
            .map(|chunk| Value::String(chunk.as_wire().to_string()))
            .collect();
        json!({ "result": self.text, "chunks": chunks })
    }
}
