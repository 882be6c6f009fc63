//! Backend identities and the outbound call error taxonomy.

use axum::http::StatusCode;
use std::fmt;
use thiserror::Error;

/// Header carrying the caller's identity, both inbound and outbound.
pub const X_USER_NAME: &str = "x-user-name";

/// One of the three downstream services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Libraries, books, availability counts and condition.
    Catalog,
    /// Per-user rating ("stars").
    Reputation,
    /// Reservations and outstanding loan amounts.
    Booking,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Catalog, Backend::Reputation, Backend::Booking];

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Catalog => "catalog",
            Backend::Reputation => "reputation",
            Backend::Booking => "booking",
        }
    }

    /// Stable client-facing message when this backend cannot be reached.
    pub fn unavailable_message(&self) -> &'static str {
        match self {
            Backend::Catalog => "Library Service unavailable",
            Backend::Reputation => "Bonus Service unavailable",
            Backend::Booking => "Reservation Service unavailable",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from a single outbound call.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Circuit open, transport failure, timeout, or a 5xx answer.
    #[error("{backend} unavailable: {reason}")]
    Unavailable { backend: Backend, reason: String },

    /// The backend answered but the payload could not be decoded.
    #[error("{backend} sent a malformed response: {reason}")]
    BadResponse { backend: Backend, reason: String },

    /// The backend answered with a non-success status.
    #[error("{backend} answered {status}")]
    ErrorStatus { backend: Backend, status: StatusCode },

    /// The outbound request could not be built from the given values.
    #[error("cannot build request for {backend}: {reason}")]
    InvalidRequest { backend: Backend, reason: String },
}

impl UpstreamError {
    pub fn backend(&self) -> Backend {
        match self {
            UpstreamError::Unavailable { backend, .. }
            | UpstreamError::BadResponse { backend, .. }
            | UpstreamError::ErrorStatus { backend, .. }
            | UpstreamError::InvalidRequest { backend, .. } => *backend,
        }
    }

    /// Label used in metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            UpstreamError::Unavailable { .. } => "unavailable",
            UpstreamError::BadResponse { .. } => "bad_response",
            UpstreamError::ErrorStatus { .. } => "error_status",
            UpstreamError::InvalidRequest { .. } => "invalid_request",
        }
    }
}
