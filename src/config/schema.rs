//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The three downstream services.
    pub backends: BackendsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Circuit breaker settings, applied to every backend independently.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Deferred write retry settings.
    pub retry: RetryConfig,

    /// Default paging for list endpoints.
    pub pagination: PaginationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Downstream service definitions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendsConfig {
    /// Libraries and books.
    pub catalog: BackendConfig,

    /// User ratings.
    pub reputation: BackendConfig,

    /// Reservations.
    pub booking: BackendConfig,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            catalog: BackendConfig::new("library-service", "http://library-service:8060"),
            reputation: BackendConfig::new("rating-service", "http://rating-service:8050"),
            booking: BackendConfig::new("reservation-service", "http://reservation-service:8070"),
        }
    }
}

/// A single downstream service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Identifier used in logs and metrics.
    pub name: String,

    /// Base URL (e.g., "http://127.0.0.1:8060").
    pub base_url: String,
}

impl BackendConfig {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for a whole client request in seconds.
    pub request_secs: u64,

    /// Deadline for a single outbound call in milliseconds.
    pub upstream_ms: u64,
}

impl TimeoutConfig {
    pub fn upstream(&self) -> Duration {
        Duration::from_millis(self.upstream_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_ms: 5_000,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Failures within one counting window that open the circuit.
    pub failure_threshold: u32,

    /// Length of the failure counting window in seconds.
    pub window_secs: u64,

    /// Time spent Open before trial calls are let through, in seconds.
    pub cooldown_secs: u64,

    /// Concurrent trial calls allowed while Half-Open.
    pub half_open_max_calls: u32,

    /// Successful trials needed to close the circuit again.
    pub success_threshold: u32,
}

impl CircuitBreakerConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            window_secs: 60,
            cooldown_secs: 30,
            half_open_max_calls: 1,
            success_threshold: 1,
        }
    }
}

/// Retry configuration for deferred writes.
///
/// The interval is fixed; there is no backoff growth and no attempt cap.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay before a failed job re-enters the queue, in seconds.
    pub interval_secs: u64,
}

impl RetryConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { interval_secs: 10 }
    }
}

/// Paging defaults applied when the client omits `page`/`size`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_page: usize,
    pub default_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_size: 100,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
