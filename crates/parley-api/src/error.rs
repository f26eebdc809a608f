//! API error types and JSON error response formatting.
//!
//! Every failure leaves the server as a non-2xx status with an
//! `{ error, message? }` body, which the chat client turns into the detail
//! of its error notification.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use parley_core::ErrorBody;
use tracing::error;

use crate::provider::ProviderError;

/// Label of the 400 returned for a blank message.
pub const EMPTY_MESSAGE: &str = "[Chat]: Empty message provided.";

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 400 - the message text was blank.
    #[error("empty message")]
    EmptyMessage,
    /// 400 - the body could not be parsed.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// 413 - the body exceeded `server.body_limit_bytes`.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    /// The upstream provider answered with a non-success status. Relayed
    /// with the same status.
    #[error("upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },
    /// 500 - anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::EmptyMessage => (StatusCode::BAD_REQUEST, ErrorBody::new(EMPTY_MESSAGE)),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("bad_request").with_message(msg),
            ),
            ApiError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorBody::new("payload_too_large").with_message(msg),
            ),
            ApiError::Upstream { status, message } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                ErrorBody::new("API Error").with_message(message),
            ),
            ApiError::Internal(msg) => {
                error!(error = %msg, "Chat request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("Internal Server Error").with_message(msg),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Upstream { status, message } => ApiError::Upstream { status, message },
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_is_relayed() {
        let resp = ApiError::Upstream {
            status: 429,
            message: "rate limited".to_string(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_invalid_upstream_status_becomes_bad_gateway() {
        let resp = ApiError::Upstream {
            status: 42,
            message: "odd".to_string(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_provider_error_mapping() {
        let upstream: ApiError = ProviderError::Upstream {
            status: 503,
            message: "overloaded".to_string(),
        }
        .into();
        assert!(matches!(upstream, ApiError::Upstream { status: 503, .. }));

        let missing: ApiError = ProviderError::MissingApiKey("OPENROUTER_API_KEY".to_string()).into();
        assert!(matches!(missing, ApiError::Internal(_)));
        assert_eq!(
            missing.to_string(),
            "internal error: API key not set: environment variable OPENROUTER_API_KEY is empty"
        );
    }

    #[test]
    fn test_empty_message_status() {
        assert_eq!(
            ApiError::EmptyMessage.into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
