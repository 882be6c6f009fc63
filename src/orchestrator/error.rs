//! Orchestrator error taxonomy.

use thiserror::Error;

use crate::upstream::UpstreamError;

/// Why a client-facing use case did not produce a result.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A fail-fast backend call failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// A business rule rejected the request.
    #[error("user cannot take new book")]
    PreconditionFailed { outstanding: i64, limit: i64 },

    /// The client's request was malformed.
    #[error("{0}")]
    InvalidRequest(String),

    /// The client-facing deadline passed before a response was ready.
    #[error("request timed out")]
    RequestTimeout,

    /// Work running on a background task did not complete.
    #[error("internal error: {0}")]
    Internal(String),
}
