//! Operation routing subsystem.
//!
//! # Data Flow
//! ```text
//! Job input (api_name = "generate")
//!     → operation.rs (resolve name to Operation)
//!     → Operation::verb() / Operation::path()
//!     → backend client issues the call
//! ```
//!
//! # Design Decisions
//! - The table is a closed enum, so every verb/path pair is checked at compile time
//! - Inbound names are validated once, at the edge, via `FromStr`
//! - Unknown names never reach the backend

pub mod operation;

pub use operation::{Operation, UnknownOperation, Verb};
