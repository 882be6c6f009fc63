//! Error responses.
//!
//! Every failure leaves the gateway as `{"message": "..."}`; a request either
//! gets its composite payload or exactly one error body, never both.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::orchestrator::GatewayError;
use crate::upstream::UpstreamError;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

/// A [`GatewayError`] on its way to the client.
#[derive(Debug)]
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// Shorthand for a 400 with a fixed message.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self(GatewayError::InvalidRequest(message.into()))
    }

    pub fn status_and_message(&self) -> (StatusCode, String) {
        match &self.0 {
            GatewayError::Upstream(e) => match e {
                UpstreamError::Unavailable { backend, .. } => {
                    (StatusCode::SERVICE_UNAVAILABLE, backend.unavailable_message().to_string())
                }
                UpstreamError::ErrorStatus { status, .. } => (*status, e.to_string()),
                UpstreamError::BadResponse { .. } | UpstreamError::InvalidRequest { .. } => {
                    (StatusCode::BAD_REQUEST, e.to_string())
                }
            },
            GatewayError::PreconditionFailed { .. } => (StatusCode::BAD_REQUEST, self.0.to_string()),
            GatewayError::InvalidRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            GatewayError::RequestTimeout => (StatusCode::REQUEST_TIMEOUT, self.0.to_string()),
            GatewayError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            tracing::warn!(status = %status, error = %self.0, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self.0, "Request rejected");
        }
        (status, Json(ErrorBody { message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::Backend;

    fn upstream(err: UpstreamError) -> (StatusCode, String) {
        ApiError(GatewayError::Upstream(err)).status_and_message()
    }

    #[test]
    fn test_unavailable_maps_to_503_with_stable_message() {
        let (status, message) = upstream(UpstreamError::Unavailable {
            backend: Backend::Booking,
            reason: "connection refused".into(),
        });
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(message, "Reservation Service unavailable");
    }

    #[test]
    fn test_error_status_passes_backend_status_through() {
        let (status, message) = upstream(UpstreamError::ErrorStatus {
            backend: Backend::Catalog,
            status: StatusCode::NOT_FOUND,
        });
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(message.contains("catalog"));
    }

    #[test]
    fn test_bad_response_is_client_error() {
        let (status, _) = upstream(UpstreamError::BadResponse {
            backend: Backend::Reputation,
            reason: "expected value".into(),
        });
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_precondition_message() {
        let (status, message) = ApiError(GatewayError::PreconditionFailed {
            outstanding: 3,
            limit: 3,
        })
        .status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "user cannot take new book");
    }

    #[test]
    fn test_timeout_and_internal_statuses() {
        let (status, message) = ApiError(GatewayError::RequestTimeout).status_and_message();
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(message, "request timed out");

        let (status, message) = ApiError(GatewayError::Internal("task panicked".into())).status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "internal error");
    }

    #[tokio::test]
    async fn test_body_is_message_object() {
        let response = ApiError::invalid("page must be a positive integer").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "page must be a positive integer" }));
    }
}
