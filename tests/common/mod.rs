//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{Method, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use futures_util::StreamExt;
use serde_json::Value;
use tokio::net::TcpListener;

use kobold_worker::config::WorkerConfig;

/// A request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is not JSON")
    }
}

/// Every request the mock backend received, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<RecordedRequest>>>);

impl Recorder {
    fn push(&self, req: RecordedRequest) {
        self.0.lock().unwrap().push(req);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

/// Start a backend that always answers 200 with `body`.
pub async fn start_mock_backend(body: &'static str) -> (SocketAddr, Recorder) {
    start_programmable_backend(move |_| async move { (200, body.to_string()) }).await
}

/// Start a programmable mock backend on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> (SocketAddr, Recorder)
where
    F: Fn(RecordedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    serve_programmable_backend(listener, f)
}

/// Start a programmable mock backend on a specific address.
pub async fn start_programmable_backend_on<F, Fut>(addr: SocketAddr, f: F) -> Recorder
where
    F: Fn(RecordedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await.unwrap();
    serve_programmable_backend(listener, f).1
}

fn serve_programmable_backend<F, Fut>(listener: TcpListener, f: F) -> (SocketAddr, Recorder)
where
    F: Fn(RecordedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let addr = listener.local_addr().unwrap();
    let recorder = Recorder::default();
    let f = Arc::new(f);

    let rec = recorder.clone();
    let app = Router::new().fallback(move |method: Method, uri: Uri, body: Bytes| {
        let rec = rec.clone();
        let f = f.clone();
        async move {
            let req = RecordedRequest {
                method,
                path: uri.path().to_string(),
                body,
            };
            rec.push(req.clone());
            let (status, body) = f(req).await;
            (StatusCode::from_u16(status).unwrap(), body).into_response()
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, recorder)
}

/// Start a backend that sends `head` as a 200 response body, then aborts
/// the connection mid-response.
pub async fn start_broken_stream_backend(head: String) -> (SocketAddr, Recorder) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorder = Recorder::default();

    let rec = recorder.clone();
    let app = Router::new().fallback(move |method: Method, uri: Uri, body: Bytes| {
        let rec = rec.clone();
        let head = head.clone();
        async move {
            rec.push(RecordedRequest {
                method,
                path: uri.path().to_string(),
                body,
            });
            let head = futures_util::stream::once(async move {
                Ok::<_, std::io::Error>(Bytes::from(head))
            });
            let crash = futures_util::stream::once(async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "backend crashed",
                ))
            });
            let chunks = head.chain(crash);
            Body::from_stream(chunks).into_response()
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, recorder)
}

/// An address nothing is listening on (at the time of the call).
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Worker config pointed at `backend`, with fast retries.
pub fn worker_config(backend: SocketAddr) -> WorkerConfig {
    let mut config = WorkerConfig::default();
    config.backend.base_url = format!("http://{}", backend);
    config.backend.request_timeout_secs = 10;
    config.backend.connect_timeout_secs = 2;
    config.retries.backoff_factor_ms = 10;
    config.readiness.interval_ms = 50;
    config
}

/// A KoboldCpp-style event stream carrying `tokens`.
pub fn sse_body(tokens: &[&str]) -> String {
    tokens
        .iter()
        .map(|t| format!("event: message\ndata: {}\n\n", serde_json::json!({ "token": t })))
        .collect()
}
