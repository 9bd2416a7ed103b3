//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the job API handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Run each job through the request proxy
//! - Deliver streamed output as server-sent events
//! - Observability (metrics, per-job spans)

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures_util::stream::{self, BoxStream, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::config::WorkerConfig;
use crate::http::request::JobRequest;
use crate::http::response::{JobFailure, JobResponse};
use crate::observability::{metrics, tracing::job_span};
use crate::proxy::{JobInput, JobOutput, ProxyError, RequestProxy, StreamChunk};

/// Slack between the backend deadline and the job deadline, so backend
/// timeouts surface as job failures rather than bare 408s.
const JOB_DEADLINE_SLACK_SECS: u64 = 30;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<RequestProxy>,
    pub aggregate_streams: bool,
}

/// HTTP server for the job API.
pub struct HttpServer {
    router: Router,
    config: WorkerConfig,
}

impl HttpServer {
    /// Create a new HTTP server around an already-built proxy.
    pub fn new(config: WorkerConfig, proxy: Arc<RequestProxy>) -> Self {
        let state = AppState {
            proxy,
            aggregate_streams: config.streaming.aggregate,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &WorkerConfig, state: AppState) -> Router {
        let job_deadline = config.backend.request_timeout_secs + JOB_DEADLINE_SLACK_SECS;

        Router::new()
            .route("/runsync", post(runsync_handler))
            .route("/stream", post(stream_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(job_deadline)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// A clone of the router, for serving it elsewhere.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown broadcast fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            aggregate_streams = self.config.streaming.aggregate,
            "Job API starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Job API draining");
            })
            .await?;

        tracing::info!("Job API stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }
}

/// Run a job to completion and answer with a single envelope.
async fn runsync_handler(State(state): State<AppState>, Json(job): Json<JobRequest>) -> Response {
    let started = Instant::now();
    let id = job.job_id();
    let label = job.operation_label();
    let span = job_span(&id, job.api_name());

    match run_to_completion(&state, job.input).instrument(span).await {
        Ok(output) => {
            metrics::record_job(label, "completed", started);
            (StatusCode::OK, Json(JobResponse::completed(id, output))).into_response()
        }
        Err(error) => {
            tracing::warn!(job_id = %id, error = %error, "Job failed");
            metrics::record_job(label, "failed", started);
            JobFailure { id, error }.into_response()
        }
    }
}

async fn run_to_completion(state: &AppState, input: Value) -> Result<Value, ProxyError> {
    let input = JobInput::try_from(input)?;
    let operation = input.operation()?;
    if operation.is_streaming() && !state.aggregate_streams {
        return Err(ProxyError::StreamingRequiresStreamEndpoint(operation));
    }

    match state.proxy.dispatch(input).await? {
        JobOutput::Single(value) => Ok(value),
        JobOutput::Stream(tokens) => {
            let aggregated = tokens.aggregate().await;
            if let Some(message) = aggregated.failure() {
                return Err(ProxyError::StreamInterrupted(message.to_string()));
            }
            Ok(aggregated.into_json())
        }
    }
}

/// Run a job and deliver its output incrementally.
///
/// Each event carries `{"id", "output"}`. Marker chunks are sent as named
/// events (`done`, `decode_error`, `error`) so a token that happens to read
/// `[DONE]` is not mistaken for the end. The last event is `done`, or `error`
/// with an `"error"` field when the backend stream broke off. Non-streaming
/// operations produce one output event before `done`.
async fn stream_handler(State(state): State<AppState>, Json(job): Json<JobRequest>) -> Response {
    let started = Instant::now();
    let id = job.job_id();
    let label = job.operation_label();
    let span = job_span(&id, job.api_name());

    let output = match dispatch_value(&state, job.input).instrument(span).await {
        Ok(output) => output,
        Err(error) => {
            tracing::warn!(job_id = %id, error = %error, "Job failed");
            metrics::record_job(label, "failed", started);
            return JobFailure { id, error }.into_response();
        }
    };
    metrics::record_job(label, "streamed", started);

    let events: BoxStream<'static, Result<Event, axum::Error>> = match output {
        JobOutput::Stream(tokens) => tokens.map(move |chunk| chunk_event(&id, &chunk)).boxed(),
        JobOutput::Single(value) => {
            let output = Event::default().json_data(json!({ "id": id, "output": value }));
            let done = chunk_event(&id, &StreamChunk::Done);
            stream::iter([output, done]).boxed()
        }
    };

    Sse::new(events).keep_alive(KeepAlive::default()).into_response()
}

fn chunk_event(id: &str, chunk: &StreamChunk) -> Result<Event, axum::Error> {
    let mut data = json!({ "id": id, "output": chunk });
    if let StreamChunk::Failed { message } = chunk {
        data["error"] = Value::String(message.clone());
    }

    let event = Event::default().json_data(data)?;
    Ok(match chunk.event_name() {
        Some(name) => event.event(name),
        None => event,
    })
}

async fn dispatch_value(state: &AppState, input: Value) -> Result<JobOutput, ProxyError> {
    let input = JobInput::try_from(input)?;
    state.proxy.dispatch(input).await
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ready" }))
}
