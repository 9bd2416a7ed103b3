//! Startup orchestration.
//!
//! # Order
//! 1. Build the backend client and request proxy from config
//! 2. Start the metrics endpoint (when enabled)
//! 3. Block on the readiness gate
//! 4. Bind the job API listener and serve until shutdown
//!
//! Fail fast: any startup error is fatal. The listener binds last, so the
//! job API never accepts work before the backend is up.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::backend::{BackendClient, BackendError};
use crate::config::WorkerConfig;
use crate::health::{Readiness, ReadinessGate};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics;
use crate::proxy::RequestProxy;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("failed to bind job API on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("job API failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// Run the worker until `shutdown` fires.
pub async fn run(config: WorkerConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    let client = Arc::new(BackendClient::from_config(&config)?);
    let proxy = Arc::new(RequestProxy::new(
        client.clone(),
        config.streaming.channel_capacity,
    ));

    tracing::info!(
        backend = %client.base_url(),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.backend.request_timeout_secs,
        max_retries = client.retry_policy().max_retries(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse::<SocketAddr>() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let gate = ReadinessGate::new(client, &config.readiness);
    match gate.wait(shutdown.subscribe()).await {
        Readiness::Ready { .. } => {}
        Readiness::Interrupted => {
            tracing::info!("Shutdown requested before backend became ready");
            return Ok(());
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let server = HttpServer::new(config, proxy);
    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)
}
