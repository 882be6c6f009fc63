//! Wire transport for outbound calls.
//!
//! The [`Transport`] trait is the seam between [`BackendClient`] and the
//! network. Production uses a pooled hyper client; tests substitute an
//! in-memory fake.
//!
//! [`BackendClient`]: crate::upstream::BackendClient

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

use crate::upstream::types::{Backend, UpstreamError};

/// Largest response body accepted from a backend.
pub const MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

/// A fully read backend response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self, backend: Backend) -> Result<T, UpstreamError> {
        serde_json::from_slice(&self.body).map_err(|e| UpstreamError::BadResponse {
            backend,
            reason: e.to_string(),
        })
    }
}

/// Failure below the HTTP status level.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("reading response body failed: {0}")]
    Body(String),
}

/// Sends one request and returns the complete response.
///
/// Implementations must consume the response body on every path so the
/// underlying connection is released.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request<Body>) -> Result<UpstreamResponse, TransportError>;
}

/// Pooled HTTP/1.1 + HTTP/2 client.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Body>,
}

impl HyperTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, request: Request<Body>) -> Result<UpstreamResponse, TransportError> {
        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(Body::new(body), MAX_RESPONSE_BYTES)
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(UpstreamResponse {
            status: parts.status,
            body,
        })
    }
}
