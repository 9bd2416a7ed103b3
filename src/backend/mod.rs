//! Backend connectivity subsystem.
//!
//! # Data Flow
//! ```text
//! Operation + job body
//!     → client.rs (verb/path from the descriptor, fixed base URL)
//!     → resilience (retry 502/503/504 and connect failures)
//!     → reqwest::Response handed back to the proxy
//! ```
//!
//! # Design Decisions
//! - One client per process, constructed explicitly and injected
//! - The base address is set at construction and never changes
//! - Per-request deadline enforced by the client for every call

pub mod client;
pub mod error;

pub use client::BackendClient;
pub use error::BackendError;
