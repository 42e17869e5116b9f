//! Guard rejections and their HTTP mapping.
//!
//! # Responsibilities
//! - Name every way the guard chain can stop a request
//! - Render each one as a JSON error response with the right status
//!
//! # Design Decisions
//! - Body shape is always `{"error": ...}`; quota rejections add `retry_after`
//! - Internal failures never leak details to the client

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::security::rate_limit::QuotaScope;

pub const INTERNAL_ERROR: &str = "Internal server error";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardRejection {
    /// Client exceeded a quota; retrying after `retry_after_secs` succeeds.
    #[error("{}", .scope.message())]
    QuotaExceeded {
        scope: QuotaScope,
        retry_after_secs: u64,
    },

    #[error("Forbidden - CSRF protection")]
    ForbiddenOrigin,

    #[error("{0}")]
    ValidationFailed(String),

    /// Unexpected failure inside the chain. The detail is logged, not sent.
    #[error("Internal server error")]
    Internal(String),
}

impl GuardRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            GuardRejection::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            GuardRejection::ForbiddenOrigin => StatusCode::FORBIDDEN,
            GuardRejection::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            GuardRejection::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            GuardRejection::QuotaExceeded { scope, .. } => scope.as_str(),
            GuardRejection::ForbiddenOrigin => "csrf",
            GuardRejection::ValidationFailed(_) => "validation",
            GuardRejection::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            GuardRejection::QuotaExceeded {
                scope,
                retry_after_secs,
            } => {
                let mut response = (
                    status,
                    Json(json!({
                        "error": scope.message(),
                        "retry_after": retry_after_secs,
                    })),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
                response
            }
            GuardRejection::Internal(detail) => {
                tracing::error!(error = %detail, "Internal guard failure");
                (status, Json(json!({ "error": INTERNAL_ERROR }))).into_response()
            }
            other => (status, Json(json!({ "error": other.to_string() }))).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_quota_rejection_body() {
        let response = GuardRejection::QuotaExceeded {
            scope: QuotaScope::Path,
            retry_after_secs: 42,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
        assert_eq!(
            body_json(response).await,
            json!({
                "error": "Too many requests to this endpoint. Please try again later.",
                "retry_after": 42
            })
        );
    }

    #[tokio::test]
    async fn test_csrf_rejection_body() {
        let response = GuardRejection::ForbiddenOrigin.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Forbidden - CSRF protection" })
        );
    }

    #[tokio::test]
    async fn test_internal_detail_not_exposed() {
        let response = GuardRejection::Internal("store poisoned".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Internal server error" })
        );
    }

    #[test]
    fn test_validation_message_passthrough() {
        let rejection = GuardRejection::ValidationFailed("Wallet address is required".into());
        assert_eq!(rejection.status(), StatusCode::BAD_REQUEST);
        assert_eq!(rejection.to_string(), "Wallet address is required");
        assert_eq!(rejection.reason(), "validation");
    }
}
