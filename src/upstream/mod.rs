//! Downstream service access.
//!
//! # Data Flow
//! ```text
//! Orchestrator use case
//!     → client.rs (build request, classify outcome)
//!     → resilience::CallGate (per-backend circuit breaker)
//!     → transport.rs (hyper client, body fully drained)
//!     → Backend service
//! ```
//!
//! # Design Decisions
//! - One client and one breaker per backend, built once at startup
//! - Caller identity is forwarded as `X-User-Name` on caller-scoped calls
//! - Error classification lives here so every use case sees the same taxonomy

pub mod client;
pub mod transport;
pub mod types;

pub use client::{BackendClient, OutboundRequest};
pub use transport::{HyperTransport, Transport, TransportError, UpstreamResponse};
pub use types::{Backend, UpstreamError, X_USER_NAME};
