//! Startup readiness gate.
//!
//! # Responsibilities
//! - Probe the backend until it answers at all
//! - Hold the job API closed until then
//!
//! Any HTTP status counts as ready: the probe targets the generation
//! endpoint with a GET, which the backend rejects once it is up.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::backend::BackendClient;
use crate::config::ReadinessConfig;
use crate::observability::metrics;

/// Progress is logged at info level every this many failed probes.
const LOG_EVERY: u32 = 25;

/// Outcome of waiting on the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready { attempts: u32 },
    /// Shutdown was requested before the backend came up.
    Interrupted,
}

pub struct ReadinessGate {
    client: Arc<BackendClient>,
    path: String,
    interval: Duration,
}

impl ReadinessGate {
    pub fn new(client: Arc<BackendClient>, config: &ReadinessConfig) -> Self {
        Self {
            client,
            path: config.path.clone(),
            interval: Duration::from_millis(config.interval_ms),
        }
    }

    /// Block until the backend answers. Retries forever unless shut down.
    pub async fn wait(&self, mut shutdown: broadcast::Receiver<()>) -> Readiness {
        metrics::record_backend_ready(false);
        tracing::info!(
            url = %self.client.url_for(&self.path),
            interval = ?self.interval,
            "Waiting for backend"
        );

        let mut attempts = 0u32;
        loop {
            attempts += 1;

            let probe = tokio::select! {
                res = self.client.probe(&self.path) => res,
                _ = shutdown.recv() => return Readiness::Interrupted,
            };

            match probe {
                Ok(status) => {
                    tracing::info!(attempts, status = %status, "Backend is ready");
                    metrics::record_backend_ready(true);
                    return Readiness::Ready { attempts };
                }
                Err(e) if attempts % LOG_EVERY == 1 => {
                    tracing::info!(attempts, error = %e, "Backend not ready yet, retrying");
                }
                Err(e) => {
                    tracing::debug!(attempts, error = %e, "Backend not ready yet, retrying");
                }
            }

            tokio::select! {
                _ = time::sleep(self.interval) => {}
                _ = shutdown.recv() => return Readiness::Interrupted,
            }
        }
    }
}
