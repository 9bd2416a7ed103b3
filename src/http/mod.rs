//! Job API subsystem.
//!
//! # Data Flow
//! ```text
//! POST /runsync {"id"?, "input"}
//!     → request.rs (envelope, job ID)
//!     → server.rs (RequestProxy::dispatch)
//!     → response.rs (COMPLETED / FAILED envelope)
//!
//! POST /stream {"id"?, "input"}
//!     → server.rs → server-sent events, one per chunk, ending with [DONE]
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::JobRequest;
pub use response::{JobResponse, JobStatus};
pub use server::HttpServer;
