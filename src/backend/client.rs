//! HTTP client bound to the local generation backend.
//!
//! # Responsibilities
//! - Own the connection pool and the retry policy
//! - Build the URL for an operation from the fixed base address
//! - Retry forcelisted statuses and connect failures with backoff
//! - Probe the backend for readiness (no retries)

use std::time::{Duration, Instant};

use reqwest::{Response, StatusCode};
use serde::Serialize;
use url::Url;

use crate::backend::error::BackendError;
use crate::config::WorkerConfig;
use crate::observability::metrics;
use crate::resilience::{RetryPolicy, Timeouts};
use crate::routing::{Operation, Verb};

/// Injectable backend client. Cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
    timeouts: Timeouts,
}

impl BackendClient {
    /// Create a client for `base_url` with the given retry policy and deadlines.
    pub fn new(base_url: &str, retry: RetryPolicy, timeouts: Timeouts) -> Result<Self, BackendError> {
        Url::parse(base_url).map_err(|source| BackendError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;

        // The backend is always local; environment proxies must not apply.
        let http = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .no_proxy()
            .build()
            .map_err(BackendError::Client)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
            timeouts,
        })
    }

    pub fn from_config(config: &WorkerConfig) -> Result<Self, BackendError> {
        Self::new(
            &config.backend.base_url,
            RetryPolicy::new(&config.retries),
            Timeouts::from_config(&config.backend),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Issue the call for `operation`, retrying transient failures.
    ///
    /// `body` is ignored for GET operations. The returned response may carry
    /// any status outside the retry forcelist.
    pub async fn send<B>(&self, operation: Operation, body: Option<&B>) -> Result<Response, BackendError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url_for(operation.path());
        let method = operation.verb().as_method();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let started = Instant::now();

            let mut request = self.http.request(method.clone(), &url);
            if let (Verb::Post, Some(body)) = (operation.verb(), body) {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    metrics::record_backend_call(operation, status.as_u16(), started);

                    if !self.retry.is_retryable_status(status) {
                        return Ok(response);
                    }
                    if !self.retry.can_retry(attempts) {
                        tracing::error!(
                            operation = %operation,
                            attempts,
                            status = %status,
                            "Retry budget exhausted"
                        );
                        return Err(BackendError::RetriesExhausted {
                            operation,
                            status,
                            attempts,
                        });
                    }

                    let backoff = self.retry.backoff(attempts);
                    tracing::info!(operation = %operation, attempt = attempts, delay = ?backoff, status = %status, "Retrying backend call");
                    metrics::record_backend_retry(operation, "status");
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    tracing::warn!(operation = %operation, attempt = attempts, error = %e, "Backend call failed");

                    if !(self.retry.is_retryable_error(&e) && self.retry.can_retry(attempts)) {
                        return Err(BackendError::Transport { operation, source: e });
                    }

                    let backoff = self.retry.backoff(attempts);
                    tracing::info!(operation = %operation, attempt = attempts, delay = ?backoff, "Retrying after connection error");
                    metrics::record_backend_retry(operation, "connect");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    /// Single GET against `path`. Any HTTP answer counts as success.
    pub async fn probe(&self, path: &str) -> Result<StatusCode, reqwest::Error> {
        self.http
            .get(self.url_for(path))
            .timeout(self.probe_timeout())
            .send()
            .await
            .map(|response| response.status())
    }

    fn probe_timeout(&self) -> Duration {
        self.timeouts.connect
    }
}
