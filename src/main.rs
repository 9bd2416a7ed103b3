//! KoboldCpp serverless worker.
//!
//! Exposes a local KoboldCpp-compatible backend as a job API.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                     WORKER                        │
//!                      │                                                   │
//!     Job request      │  ┌──────────┐    ┌──────────┐    ┌────────────┐  │
//!     ─────────────────┼─▶│ http     │───▶│ proxy    │───▶│ backend    │──┼───▶ KoboldCpp
//!                      │  │ job API  │    │ dispatch │    │ client     │  │     (local)
//!     Job result /     │  └──────────┘    └────┬─────┘    └─────┬──────┘  │
//!     SSE chunks       │        ▲              │  routing       │ retry   │
//!     ◀────────────────┼────────┴──────────────┘  (Operation)   │ backoff │
//!                      │                                        ▼         │
//!                      │  ┌──────────────────────────────────────────────┐│
//!                      │  │ config · health (readiness) · lifecycle ·    ││
//!                      │  │ observability (logs, metrics, job spans)     ││
//!                      │  └──────────────────────────────────────────────┘│
//!                      └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use kobold_worker::config::load_or_default;
use kobold_worker::lifecycle::{self, signals, Shutdown};
use kobold_worker::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "kobold-worker")]
#[command(about = "Serverless worker for a local KoboldCpp backend", long_about = None)]
struct Args {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_or_default(args.config.as_deref())?;

    init_logging(&config.observability)?;

    tracing::info!(
        config = ?args.config,
        "kobold-worker v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    lifecycle::run(config, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
