//! Line decoding for the backend's server-sent event stream.
//!
//! The backend emits `event: message` / `data: {"token": "..."}` pairs
//! separated by blank lines. Only `data:` lines matter here.

use serde::Deserialize;

use crate::proxy::stream::StreamChunk;

pub const DATA_PREFIX: &str = "data:";
pub const EVENT_PREFIX: &str = "event:";

/// Splits an arbitrary byte stream into lines.
///
/// Bytes are buffered until a `\n` arrives, so multi-byte characters split
/// across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes; returns every line completed by them, without terminators.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Flush a trailing line left without a terminator.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buf);
        let line = String::from_utf8_lossy(&rest);
        Some(line.trim_end_matches('\r').to_string())
    }
}

#[derive(Deserialize)]
struct TokenEvent {
    token: String,
}

/// Turn one event-stream line into a chunk.
///
/// Returns `None` for lines that carry no data (event names, comments,
/// blank separators).
pub fn parse_event_line(line: &str) -> Option<StreamChunk> {
    let payload = line.strip_prefix(DATA_PREFIX)?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);

    match serde_json::from_str::<TokenEvent>(payload) {
        Ok(event) => Some(StreamChunk::Token(event.token)),
        Err(e) => {
            tracing::warn!(error = %e, payload = %payload, "Malformed stream event");
            Some(StreamChunk::DecodeFailure {
                raw: payload.to_string(),
            })
        }
    }
}
