//! Request extraction.
//!
//! # Responsibilities
//! - Resolve the caller's identity from the `X-User-Name` header
//! - Reject caller-scoped requests without one before any backend is called

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::http::response::ApiError;
use crate::upstream::X_USER_NAME;

/// Message returned when the identity header is missing or empty.
pub const MISSING_CALLER: &str = "username must be given as X-User-Name Header";

/// The authenticated caller, taken verbatim from `X-User-Name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(pub String);

impl CallerIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(X_USER_NAME)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| CallerIdentity(name.to_string()))
            .ok_or_else(|| ApiError::invalid(MISSING_CALLER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<CallerIdentity, ApiError> {
        let mut builder = Request::builder().uri("/api/v1/rating");
        if let Some(value) = header {
            builder = builder.header("X-User-Name", value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        CallerIdentity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_header_is_case_insensitive() {
        let caller = extract(Some("Test Max")).await.unwrap();
        assert_eq!(caller.as_str(), "Test Max");
    }

    #[tokio::test]
    async fn test_missing_or_blank_header_is_rejected() {
        for header in [None, Some(""), Some("   ")] {
            let err = extract(header).await.unwrap_err();
            let (status, message) = err.status_and_message();
            assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
            assert_eq!(message, MISSING_CALLER);
        }
    }
}
