//! Circuit breaker for backend protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: backend assumed down, calls fail fast
//! - Half-Open: a limited number of trial calls test if the backend recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= threshold within the counting window
//! Open → Half-Open: after the cooldown
//! Half-Open → Closed: success_threshold trial calls succeed
//! Half-Open → Open: any trial call fails
//! ```
//!
//! # Design Decisions
//! - One `CallGate` per backend, never shared across backends
//! - A rejected call is not a failure; only attempted calls move the state
//! - Every transition starts a new generation; results of calls admitted under
//!   an older generation are ignored
//! - State is behind a short-lived `std::sync::Mutex`, never held across `.await`

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

/// Breaker state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed = 0,
    HalfOpen = 1,
    Open = 2,
}

/// The gate refused to attempt the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circuit '{gate}' is open")]
pub struct CircuitOpenError {
    pub gate: String,
}

/// Outcome of [`CallGate::execute`] when the call did not succeed.
#[derive(Debug, Error)]
pub enum GateError<E> {
    /// Rejected without attempting the call.
    #[error(transparent)]
    Open(CircuitOpenError),

    /// The call was attempted and failed.
    #[error(transparent)]
    Call(E),
}

#[derive(Debug)]
struct GateState {
    state: CircuitState,
    generation: u64,
    consecutive_failures: u32,
    trial_successes: u32,
    trials_in_flight: u32,
    window_start: Instant,
    opened_at: Option<Instant>,
}

/// Circuit breaker guarding every outbound call to one backend.
#[derive(Debug)]
pub struct CallGate {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<GateState>,
}

impl CallGate {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        metrics::record_circuit_state(&name, CircuitState::Closed as u8);
        Self {
            name,
            config,
            inner: Mutex::new(GateState {
                state: CircuitState::Closed,
                generation: 0,
                consecutive_failures: 0,
                trial_successes: 0,
                trials_in_flight: 0,
                window_start: Instant::now(),
                opened_at: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state, applying any cooldown or window expiry that is due.
    pub fn state(&self) -> CircuitState {
        let mut inner = self.lock();
        self.refresh(&mut inner, Instant::now());
        inner.state
    }

    /// Run `call` through the breaker.
    ///
    /// When the circuit is open the future is dropped without being polled,
    /// so no request reaches the backend.
    pub async fn execute<T, E, Fut>(&self, call: Fut) -> Result<T, GateError<E>>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        let permit = self.acquire().map_err(GateError::Open)?;
        match call.await {
            Ok(value) => {
                permit.success();
                Ok(value)
            }
            Err(e) => {
                permit.failure();
                Err(GateError::Call(e))
            }
        }
    }

    /// Ask for permission to attempt one call.
    pub fn acquire(&self) -> Result<Permit<'_>, CircuitOpenError> {
        let mut inner = self.lock();
        self.refresh(&mut inner, Instant::now());

        let trial = match inner.state {
            CircuitState::Closed => false,
            CircuitState::HalfOpen if inner.trials_in_flight < self.config.half_open_max_calls => {
                inner.trials_in_flight += 1;
                true
            }
            CircuitState::HalfOpen | CircuitState::Open => {
                tracing::debug!(backend = %self.name, state = ?inner.state, "Call rejected by circuit breaker");
                return Err(CircuitOpenError {
                    gate: self.name.clone(),
                });
            }
        };

        Ok(Permit {
            gate: self,
            generation: inner.generation,
            trial,
            settled: false,
        })
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refresh(&self, inner: &mut GateState, now: Instant) {
        match inner.state {
            CircuitState::Open => {
                let cooled = inner
                    .opened_at
                    .map_or(true, |at| now.duration_since(at) >= self.config.cooldown());
                if cooled {
                    self.transition(inner, CircuitState::HalfOpen, now);
                }
            }
            CircuitState::Closed => {
                if now.duration_since(inner.window_start) >= self.config.window() {
                    inner.consecutive_failures = 0;
                    inner.window_start = now;
                }
            }
            CircuitState::HalfOpen => {}
        }
    }

    fn settle(&self, generation: u64, trial: bool, success: bool) {
        let mut inner = self.lock();
        let now = Instant::now();
        self.refresh(&mut inner, now);

        if generation != inner.generation {
            return;
        }

        match (inner.state, success) {
            (CircuitState::Closed, true) => inner.consecutive_failures = 0,
            (CircuitState::Closed, false) => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    self.transition(&mut inner, CircuitState::Open, now);
                }
            }
            (CircuitState::HalfOpen, true) => {
                if trial {
                    inner.trials_in_flight = inner.trials_in_flight.saturating_sub(1);
                }
                inner.trial_successes += 1;
                if inner.trial_successes >= self.config.success_threshold {
                    self.transition(&mut inner, CircuitState::Closed, now);
                }
            }
            (CircuitState::HalfOpen, false) => {
                self.transition(&mut inner, CircuitState::Open, now);
            }
            (CircuitState::Open, _) => {}
        }
    }

    fn release(&self, generation: u64) {
        let mut inner = self.lock();
        if generation == inner.generation && inner.state == CircuitState::HalfOpen {
            inner.trials_in_flight = inner.trials_in_flight.saturating_sub(1);
        }
    }

    fn transition(&self, inner: &mut GateState, to: CircuitState, now: Instant) {
        let from = inner.state;
        inner.state = to;
        inner.generation += 1;
        inner.consecutive_failures = 0;
        inner.trial_successes = 0;
        inner.trials_in_flight = 0;
        inner.window_start = now;
        inner.opened_at = (to == CircuitState::Open).then_some(now);

        match to {
            CircuitState::Open => {
                tracing::warn!(backend = %self.name, from = ?from, "Circuit breaker opened")
            }
            _ => tracing::info!(backend = %self.name, from = ?from, to = ?to, "Circuit breaker state changed"),
        }
        metrics::record_circuit_state(&self.name, to as u8);
    }
}

/// Permission to attempt one call.
///
/// Report the outcome with [`Permit::success`] or [`Permit::failure`]. A permit
/// dropped without a verdict (e.g. the request was cancelled) frees its
/// half-open trial slot without counting either way.
#[derive(Debug)]
pub struct Permit<'a> {
    gate: &'a CallGate,
    generation: u64,
    trial: bool,
    settled: bool,
}

impl Permit<'_> {
    pub fn success(mut self) {
        self.settled = true;
        self.gate.settle(self.generation, self.trial, true);
    }

    pub fn failure(mut self) {
        self.settled = true;
        self.gate.settle(self.generation, self.trial, false);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.trial {
            self.gate.release(self.generation);
        }
    }
}
