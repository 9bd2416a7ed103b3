//! Request proxy subsystem.
//!
//! # Data Flow
//! ```text
//! JobInput { api_name, ... }
//!     → job.rs (resolve api_name, reject unknown names)
//!     → dispatcher.rs (one backend call via BackendClient)
//!     → GET / POST:        parse body → JobOutput::Single
//!     → generate_stream:   sse.rs (line decoding) → stream.rs (channel)
//!                          → JobOutput::Stream, terminated by [DONE]
//!                            (or [ERROR] if the backend stream broke off)
//! ```
//!
//! # Design Decisions
//! - The job input is forwarded verbatim, `api_name` included
//! - Malformed stream events become inline markers, never errors
//! - A streaming call the backend refuses (non-2xx) fails the job
//! - No caching: every job is a fresh backend call

pub mod dispatcher;
pub mod error;
pub mod job;
pub mod sse;
pub mod stream;

pub use dispatcher::RequestProxy;
pub use error::ProxyError;
pub use job::{JobInput, JobOutput};
pub use stream::{
    AggregatedStream, StreamChunk, TokenStream, DECODE_FAILURE_EVENT, DECODE_FAILURE_MARKER,
    DONE_EVENT, DONE_MARKER, FAILED_EVENT, FAILED_MARKER,
};
