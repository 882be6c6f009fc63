//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Backend base URLs parse and use an http(s) scheme
//! - Validate value ranges (timeouts, thresholds, retry interval > 0)
//! - Backend names are distinct (they label logs and metrics)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::{BackendConfig, GatewayConfig};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("backend '{name}' has invalid base_url '{url}': {reason}")]
    BackendUrl {
        name: String,
        url: String,
        reason: String,
    },

    #[error("backend name '{0}' is used more than once")]
    DuplicateBackend(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error(
        "timeouts.request_secs ({request_ms} ms) must exceed {calls} sequential upstream calls ({needed_ms} ms)"
    )]
    RequestBudget { request_ms: u64, needed_ms: u64, calls: u64 },
}

/// Longest chain of outbound calls one client request makes in sequence
/// (returning a book: info, status, condition, availability, rating).
pub const MAX_SEQUENTIAL_UPSTREAM_CALLS: u64 = 5;

/// Check a parsed configuration, collecting every problem.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let backends = [
        &config.backends.catalog,
        &config.backends.reputation,
        &config.backends.booking,
    ];
    let mut seen = HashSet::new();
    for backend in backends {
        if let Err(e) = check_backend_url(backend) {
            errors.push(e);
        }
        if !seen.insert(backend.name.as_str()) {
            errors.push(ValidationError::DuplicateBackend(backend.name.clone()));
        }
    }

    let positive = [
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.upstream_ms", config.timeouts.upstream_ms),
        (
            "circuit_breaker.failure_threshold",
            u64::from(config.circuit_breaker.failure_threshold),
        ),
        ("circuit_breaker.window_secs", config.circuit_breaker.window_secs),
        ("circuit_breaker.cooldown_secs", config.circuit_breaker.cooldown_secs),
        (
            "circuit_breaker.half_open_max_calls",
            u64::from(config.circuit_breaker.half_open_max_calls),
        ),
        (
            "circuit_breaker.success_threshold",
            u64::from(config.circuit_breaker.success_threshold),
        ),
        ("retry.interval_secs", config.retry.interval_secs),
        ("pagination.default_page", config.pagination.default_page as u64),
        ("pagination.default_size", config.pagination.default_size as u64),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    let request_ms = config.timeouts.request_secs.saturating_mul(1_000);
    let needed_ms = config.timeouts.upstream_ms.saturating_mul(MAX_SEQUENTIAL_UPSTREAM_CALLS);
    if request_ms > 0 && needed_ms > 0 && request_ms <= needed_ms {
        errors.push(ValidationError::RequestBudget {
            request_ms,
            needed_ms,
            calls: MAX_SEQUENTIAL_UPSTREAM_CALLS,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_backend_url(backend: &BackendConfig) -> Result<(), ValidationError> {
    let invalid = |reason: String| ValidationError::BackendUrl {
        name: backend.name.clone(),
        url: backend.base_url.clone(),
        reason,
    };

    let url = Url::parse(&backend.base_url).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.backends.catalog.base_url = "ftp://catalog".into();
        config.backends.booking.name = config.backends.reputation.name.clone();
        config.retry.interval_secs = 0;
        config.circuit_breaker.failure_threshold = 0;

        let errors = validate_config(&config).unwrap_err();

        assert_eq!(errors.len(), 5, "{:?}", errors);
        assert!(errors.contains(&ValidationError::BindAddress("nowhere".into())));
        assert!(errors.contains(&ValidationError::Zero("retry.interval_secs")));
        assert!(errors.contains(&ValidationError::Zero("circuit_breaker.failure_threshold")));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::DuplicateBackend(name) if name == "rating-service")));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::BackendUrl { name, .. } if name == "library-service")));
    }

    #[test]
    fn test_request_deadline_must_cover_sequential_calls() {
        let mut config = GatewayConfig::default();
        config.timeouts.request_secs = 10;
        config.timeouts.upstream_ms = 2_000;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::RequestBudget {
                request_ms: 10_000,
                needed_ms: 10_000,
                calls: 5,
            }]
        );

        config.timeouts.request_secs = 11;
        assert_eq!(validate_config(&config), Ok(()));
    }
}
