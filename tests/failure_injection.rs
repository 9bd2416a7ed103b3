//! Failure injection tests: transient backend errors, unreachable backends,
//! and the startup readiness gate.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;

use kobold_worker::backend::{BackendClient, BackendError};
use kobold_worker::health::{Readiness, ReadinessGate};
use kobold_worker::lifecycle::Shutdown;
use kobold_worker::proxy::{JobInput, JobOutput, ProxyError, RequestProxy, StreamChunk};
use kobold_worker::routing::Operation;

mod common;

fn generate_job() -> JobInput {
    JobInput::try_from(json!({"api_name": "generate", "prompt": "hi"})).unwrap()
}

#[tokio::test]
async fn test_retry_on_503_then_success() {
    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    let (addr, recorder) = common::start_programmable_backend(move |_| {
        let cc = cc.clone();
        async move {
            if cc.fetch_add(1, Ordering::SeqCst) < 3 {
                (503, "Service Unavailable".into())
            } else {
                (200, r#"{"results": [{"text": "ok"}]}"#.into())
            }
        }
    })
    .await;

    let config = common::worker_config(addr);
    let client = Arc::new(BackendClient::from_config(&config).unwrap());
    let proxy = RequestProxy::new(client, 8);

    let output = proxy.dispatch(generate_job()).await.unwrap();
    let JobOutput::Single(value) = output else {
        panic!("expected a single result");
    };
    assert_eq!(value, json!({"results": [{"text": "ok"}]}));
    assert_eq!(call_count.load(Ordering::SeqCst), 4);

    // every attempt carried the same body
    for req in recorder.requests() {
        assert_eq!(req.json(), json!({"api_name": "generate", "prompt": "hi"}));
    }
}

#[tokio::test]
async fn test_retry_budget_exhausted() {
    let (addr, recorder) =
        common::start_programmable_backend(|_| async { (502, "Bad Gateway".into()) }).await;

    let mut config = common::worker_config(addr);
    config.retries.max_retries = 2;
    let client = Arc::new(BackendClient::from_config(&config).unwrap());
    let proxy = RequestProxy::new(client, 8);

    let err = proxy.dispatch(generate_job()).await.unwrap_err();
    match err {
        ProxyError::Backend(BackendError::RetriesExhausted {
            operation,
            status,
            attempts,
        }) => {
            assert_eq!(operation, Operation::Generate);
            assert_eq!(status, StatusCode::BAD_GATEWAY);
            assert_eq!(attempts, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(recorder.count(), 3);
}

#[tokio::test]
async fn test_default_budget_is_ten_retries() {
    let (addr, recorder) =
        common::start_programmable_backend(|_| async { (503, "Service Unavailable".into()) })
            .await;

    let mut config = common::worker_config(addr);
    config.retries.backoff_factor_ms = 1;
    let proxy = RequestProxy::new(Arc::new(BackendClient::from_config(&config).unwrap()), 8);

    let err = proxy.dispatch(generate_job()).await.unwrap_err();
    assert!(
        matches!(
            err,
            ProxyError::Backend(BackendError::RetriesExhausted { attempts: 11, .. })
        ),
        "unexpected error: {err:?}"
    );
    assert_eq!(recorder.count(), 11);
}

#[tokio::test]
async fn test_500_is_not_retried() {
    let (addr, recorder) =
        common::start_programmable_backend(|_| async { (500, r#"{"error": "boom"}"#.into()) })
            .await;
    let config = common::worker_config(addr);
    let proxy = RequestProxy::new(Arc::new(BackendClient::from_config(&config).unwrap()), 8);

    assert!(proxy.dispatch(generate_job()).await.is_ok());
    assert_eq!(recorder.count(), 1);
}

#[tokio::test]
async fn test_unreachable_backend_surfaces_transport_error() {
    let addr = common::unused_addr().await;
    let mut config = common::worker_config(addr);
    config.retries.max_retries = 1;
    let proxy = RequestProxy::new(Arc::new(BackendClient::from_config(&config).unwrap()), 8);

    let err = proxy.dispatch(generate_job()).await.unwrap_err();
    assert!(
        matches!(
            err,
            ProxyError::Backend(BackendError::Transport {
                operation: Operation::Generate,
                ..
            })
        ),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn test_stream_retried_on_503_then_delivered() {
    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    let body = common::sse_body(&["Once", " upon"]);
    let (addr, recorder) = common::start_programmable_backend(move |_| {
        let cc = cc.clone();
        let body = body.clone();
        async move {
            if cc.fetch_add(1, Ordering::SeqCst) < 2 {
                (503, "loading model".into())
            } else {
                (200, body)
            }
        }
    })
    .await;

    let config = common::worker_config(addr);
    let proxy = RequestProxy::new(Arc::new(BackendClient::from_config(&config).unwrap()), 8);

    let input = json!({"api_name": "generate_stream", "prompt": "tell a story"});
    let job = JobInput::try_from(input.clone()).unwrap();
    let JobOutput::Stream(tokens) = proxy.dispatch(job).await.unwrap() else {
        panic!("expected a stream");
    };

    assert_eq!(
        tokens.collect_chunks().await,
        vec![
            StreamChunk::Token("Once".into()),
            StreamChunk::Token(" upon".into()),
            StreamChunk::Done,
        ]
    );
    let requests = recorder.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests
        .iter()
        .all(|r| r.path == "/api/extra/generate/stream" && r.json() == input));
}

#[tokio::test]
async fn test_broken_stream_ends_with_failure() {
    let (addr, _) = common::start_broken_stream_backend(common::sse_body(&["Hel"])).await;
    let config = common::worker_config(addr);
    let proxy = RequestProxy::new(Arc::new(BackendClient::from_config(&config).unwrap()), 8);

    let JobOutput::Stream(tokens) = proxy
        .dispatch(JobInput::try_from(json!({"api_name": "generate_stream"})).unwrap())
        .await
        .unwrap()
    else {
        panic!("expected a stream");
    };

    let chunks = tokens.collect_chunks().await;
    assert_eq!(chunks.first(), Some(&StreamChunk::Token("Hel".into())));
    assert!(
        matches!(chunks.last(), Some(StreamChunk::Failed { .. })),
        "stream should end in failure: {chunks:?}"
    );
    assert!(!chunks.contains(&StreamChunk::Done));
}

#[tokio::test]
async fn test_readiness_gate_waits_for_backend() {
    let addr = common::unused_addr().await;
    let config = common::worker_config(addr);
    let client = Arc::new(BackendClient::from_config(&config).unwrap());
    let gate = ReadinessGate::new(client, &config.readiness);
    let shutdown = Shutdown::new();

    let waiting = tokio::spawn({
        let rx = shutdown.subscribe();
        async move { gate.wait(rx).await }
    });

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!waiting.is_finished(), "gate opened before the backend was up");

    // A GET on the generation endpoint is rejected, which still counts as ready.
    let recorder = common::start_programmable_backend_on(addr, |_| async {
        (405, "Method Not Allowed".into())
    })
    .await;

    let readiness = tokio::time::timeout(Duration::from_secs(5), waiting)
        .await
        .expect("gate never opened")
        .unwrap();
    match readiness {
        Readiness::Ready { attempts } => assert!(attempts > 1),
        Readiness::Interrupted => panic!("gate was interrupted"),
    }

    let requests = recorder.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/api/v1/generate");
}

#[tokio::test]
async fn test_readiness_gate_stops_on_shutdown() {
    let addr = common::unused_addr().await;
    let config = common::worker_config(addr);
    let client = Arc::new(BackendClient::from_config(&config).unwrap());
    let gate = ReadinessGate::new(client, &config.readiness);
    let shutdown = Shutdown::new();

    let waiting = tokio::spawn({
        let rx = shutdown.subscribe();
        async move { gate.wait(rx).await }
    });

    tokio::time::sleep(Duration::from_millis(150)).await;
    shutdown.trigger();

    let readiness = tokio::time::timeout(Duration::from_secs(2), waiting)
        .await
        .expect("gate ignored shutdown")
        .unwrap();
    assert_eq!(readiness, Readiness::Interrupted);
}
