//! Backend health subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     readiness.rs probes the backend every interval
//!     → any HTTP answer: gate opens, job API starts
//!     → connection refused: sleep, probe again
//!
//! Not-ready → Ready happens once per process; there is no way back.
//! ```
//!
//! # Design Decisions
//! - No upper bound on attempts: the worker is useless without its backend
//! - Shutdown signals interrupt the wait
//! - Per-job failures are handled by resilience, not here

pub mod readiness;

pub use readiness::{Readiness, ReadinessGate};
