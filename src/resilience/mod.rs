//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → circuit_breaker.rs (reject immediately while the backend's circuit is open)
//!     → timeouts.rs (enforce the per-call deadline)
//!     → outcome recorded by the circuit breaker
//!
//! Failed side-effecting write after the client's primary action succeeded:
//!     → retries.rs (queue the write, re-attempt at a fixed interval, forever)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No inline retries on the request path; callers decide what to defer
//! - Circuit breaker prevents cascading failures, one breaker per backend

pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{CallGate, CircuitOpenError, CircuitState, GateError};
pub use retries::{Job, RetryDispatcher, RetryScheduler};
