//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → timeouts.rs (connect/request deadlines on the client)
//!     → On 502/503/504 or connect failure: retries.rs (check budget)
//!     → backoff.rs (delay before the next attempt)
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline
//! - Retry policy lives on the client, not on the proxy
//! - Exhausting the budget surfaces the last failure to the caller

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use retries::RetryPolicy;
pub use timeouts::Timeouts;
