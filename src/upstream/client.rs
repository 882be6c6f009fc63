//! Typed request/response exchange with one backend.
//!
//! # Responsibilities
//! - Build the outbound request (base URL, encoded path, query, caller header)
//! - Pass it through the backend's circuit breaker with a deadline
//! - Classify the outcome into [`UpstreamError`]
//!
//! # Design Decisions
//! - Never retries; whether to defer a failed write is the caller's decision
//! - Transport errors, timeouts and 5xx answers count as breaker failures;
//!   4xx answers are returned as `ErrorStatus` without tripping the breaker

use axum::body::Body;
use axum::http::{header, Method, Request};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

use crate::observability::metrics;
use crate::resilience::timeouts::with_deadline;
use crate::resilience::{CallGate, GateError};
use crate::upstream::transport::{Transport, UpstreamResponse};
use crate::upstream::types::{Backend, UpstreamError, X_USER_NAME};

/// Description of one outbound call, independent of the backend's address.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    method: Method,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    caller: Option<String>,
}

impl OutboundRequest {
    /// `segments` are percent-encoded individually; a trailing `""` yields a
    /// trailing slash.
    pub fn new(method: Method, segments: &[&str]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            query: Vec::new(),
            body: None,
            caller: None,
        }
    }

    pub fn get(segments: &[&str]) -> Self {
        Self::new(Method::GET, segments)
    }

    pub fn post(segments: &[&str]) -> Self {
        Self::new(Method::POST, segments)
    }

    pub fn put(segments: &[&str]) -> Self {
        Self::new(Method::PUT, segments)
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Propagate the caller's identity.
    pub fn caller(mut self, username: &str) -> Self {
        self.caller = Some(username.to_string());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Client for one backend, owning that backend's breaker.
#[derive(Clone)]
pub struct BackendClient {
    backend: Backend,
    name: Arc<str>,
    base_url: Url,
    gate: Arc<CallGate>,
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl BackendClient {
    pub fn new(
        backend: Backend,
        name: &str,
        base_url: Url,
        gate: Arc<CallGate>,
        transport: Arc<dyn Transport>,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            name: Arc::from(name),
            base_url,
            gate,
            transport,
            timeout,
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn gate(&self) -> &CallGate {
        &self.gate
    }

    /// Send a request and return the response if its status is a success.
    pub async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, UpstreamError> {
        let http_request = self.build(&request)?;
        let started = Instant::now();

        let result = self
            .gate
            .execute(async {
                let response = with_deadline(self.timeout, self.transport.send(http_request))
                    .await
                    .map_err(|e| self.unavailable(e))?
                    .map_err(|e| self.unavailable(e))?;

                if response.status.is_server_error() {
                    return Err(UpstreamError::ErrorStatus {
                        backend: self.backend,
                        status: response.status,
                    });
                }
                Ok(response)
            })
            .await;

        let outcome = match result {
            Ok(response) if response.status.is_success() => Ok(response),
            Ok(response) => Err(UpstreamError::ErrorStatus {
                backend: self.backend,
                status: response.status,
            }),
            Err(GateError::Open(e)) => Err(self.unavailable(e)),
            Err(GateError::Call(e)) => Err(e),
        };

        match &outcome {
            Ok(response) => {
                tracing::debug!(
                    backend = %self.name,
                    method = %request.method(),
                    path = %request.path(),
                    status = %response.status,
                    "Upstream call succeeded"
                );
                metrics::record_upstream_call(&self.name, "success", started);
            }
            Err(e) => {
                tracing::warn!(
                    backend = %self.name,
                    method = %request.method(),
                    path = %request.path(),
                    error = %e,
                    "Upstream call failed"
                );
                metrics::record_upstream_call(&self.name, e.outcome(), started);
            }
        }
        outcome
    }

    /// Send a request and decode a JSON body.
    pub async fn fetch<T: DeserializeOwned>(&self, request: OutboundRequest) -> Result<T, UpstreamError> {
        self.send(request).await?.json(self.backend)
    }

    fn build(&self, request: &OutboundRequest) -> Result<Request<Body>, UpstreamError> {
        let invalid = |reason: String| UpstreamError::InvalidRequest {
            backend: self.backend,
            reason,
        };

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| invalid(format!("base URL '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(&request.segments);
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }

        let mut builder = Request::builder()
            .method(request.method.clone())
            .uri(url.as_str())
            .header(header::ACCEPT, "application/json");
        if let Some(caller) = &request.caller {
            builder = builder.header(X_USER_NAME, caller.as_str());
        }

        let body = match &request.body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        builder.body(body).map_err(|e| invalid(e.to_string()))
    }

    fn unavailable(&self, reason: impl ToString) -> UpstreamError {
        UpstreamError::Unavailable {
            backend: self.backend,
            reason: reason.to_string(),
        }
    }
}
