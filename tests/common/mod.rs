//! Shared utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use library_gateway::config::{BackendConfig, GatewayConfig};
use library_gateway::lifecycle::Shutdown;
use library_gateway::upstream::{Transport, TransportError, UpstreamResponse};
use library_gateway::HttpServer;

/// Hosts used by [`fake_config`].
pub const CATALOG: &str = "catalog";
pub const REPUTATION: &str = "reputation";
pub const BOOKING: &str = "booking";

/// One request seen by [`FakeTransport`] or a mock backend.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub host: String,
    pub path: String,
    pub query: Option<String>,
    pub caller: Option<String>,
    pub body: Option<Value>,
}

/// In-memory backends keyed by host and path.
///
/// Unknown routes answer 404; hosts taken down fail at the transport level
/// like a refused connection. A call is recorded only once it completes, so
/// a call cancelled during a host's latency leaves no trace.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<(Method, String, String), (StatusCode, String)>>,
    down: Mutex<HashSet<String>>,
    latency: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<Recorded>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: Method, host: &str, path: &str, status: u16, body: Value) -> &Self {
        let body = if body.is_null() { String::new() } else { body.to_string() };
        self.routes.lock().unwrap().insert(
            (method, host.to_string(), path.to_string()),
            (StatusCode::from_u16(status).unwrap(), body),
        );
        self
    }

    pub fn take_down(&self, host: &str) {
        self.down.lock().unwrap().insert(host.to_string());
    }

    /// Delay every answer from `host`.
    pub fn slow_down(&self, host: &str, latency: Duration) {
        self.latency.lock().unwrap().insert(host.to_string(), latency);
    }

    pub fn bring_up(&self, host: &str) {
        self.down.lock().unwrap().remove(host);
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    /// Requests that reached `host` with `method` on `path`.
    pub fn calls_to(&self, method: Method, host: &str, path: &str) -> Vec<Recorded> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.host == host && c.path == path)
            .collect()
    }

    pub fn count_host(&self, host: &str) -> usize {
        self.calls().iter().filter(|c| c.host == host).count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: Request<Body>) -> Result<UpstreamResponse, TransportError> {
        let (parts, body) = request.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX)
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;
        let host = parts.uri.host().unwrap_or_default().to_string();
        let path = parts.uri.path().to_string();

        let latency = self.latency.lock().unwrap().get(&host).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        self.calls.lock().unwrap().push(Recorded {
            method: parts.method.clone(),
            host: host.clone(),
            path: path.clone(),
            query: parts.uri.query().map(str::to_string),
            caller: parts
                .headers
                .get("x-user-name")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body: serde_json::from_slice(&bytes).ok(),
        });

        if self.down.lock().unwrap().contains(&host) {
            return Err(TransportError::Request(format!("connection refused: {}", host)));
        }

        let routes = self.routes.lock().unwrap();
        match routes.get(&(parts.method, host, path)) {
            Some((status, body)) => Ok(UpstreamResponse::new(*status, body.clone())),
            None => Ok(UpstreamResponse::new(StatusCode::NOT_FOUND, "")),
        }
    }
}

/// Config whose backends are the [`FakeTransport`] hosts.
pub fn fake_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.backends.catalog = BackendConfig::new("library-service", format!("http://{}", CATALOG));
    config.backends.reputation = BackendConfig::new("rating-service", format!("http://{}", REPUTATION));
    config.backends.booking = BackendConfig::new("reservation-service", format!("http://{}", BOOKING));
    config.timeouts.upstream_ms = 1_000;
    config
}

/// Bind an ephemeral port and serve `server` on it until `shutdown` fires.
pub async fn spawn_gateway(server: HttpServer) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Start a programmable mock backend on an ephemeral port.
///
/// `f` receives the parsed request and returns status and JSON body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(Recorded) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let (read, mut write) = socket.into_split();
                        let mut reader = BufReader::new(read);

                        let mut request_line = String::new();
                        if reader.read_line(&mut request_line).await.is_err() {
                            return;
                        }
                        let mut parts = request_line.split_whitespace();
                        let method = parts.next().unwrap_or("GET").parse().unwrap_or(Method::GET);
                        let target = parts.next().unwrap_or("/").to_string();

                        let mut content_length = 0;
                        let mut caller = None;
                        loop {
                            let mut line = String::new();
                            if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                                break;
                            }
                            let line = line.trim_end();
                            if line.is_empty() {
                                break;
                            }
                            if let Some((name, value)) = line.split_once(':') {
                                match name.trim().to_ascii_lowercase().as_str() {
                                    "content-length" => content_length = value.trim().parse().unwrap_or(0),
                                    "x-user-name" => caller = Some(value.trim().to_string()),
                                    _ => {}
                                }
                            }
                        }

                        let mut body = vec![0; content_length];
                        if content_length > 0 && reader.read_exact(&mut body).await.is_err() {
                            return;
                        }

                        let (path, query) = match target.split_once('?') {
                            Some((path, query)) => (path.to_string(), Some(query.to_string())),
                            None => (target, None),
                        };
                        let (status, body) = f(Recorded {
                            method,
                            host: addr.to_string(),
                            path,
                            query,
                            caller,
                            body: serde_json::from_slice(&body).ok(),
                        })
                        .await;

                        let response = format!(
                            "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            body.len(),
                            body
                        );
                        let _ = write.write_all(response.as_bytes()).await;
                        let _ = write.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}
