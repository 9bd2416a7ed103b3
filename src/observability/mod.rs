//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!     → tracing.rs (per-job spans)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Job ID flows through every log line of a job
//! - Metrics endpoint disabled by default

pub mod logging;
pub mod metrics;
pub mod tracing;
