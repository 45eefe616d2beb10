//! API error types and response formatting.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gamepulse_core::Error;
use serde::Serialize;

/// API error type that converts to appropriate HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A proxied upstream call (or its configuration) failed.
    #[error("{context}: {source}")]
    Upstream {
        /// What the handler was doing, shown to clients as `error`.
        context: &'static str,
        #[source]
        source: Error,
    },

    /// Session authentication failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Invalid request parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Client exceeded its request quota.
    #[error("rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Adapter for `map_err` that attaches a handler-specific context.
    pub fn upstream(context: &'static str) -> impl FnOnce(Error) -> Self {
        move |source| Self::Upstream { context, source }
    }
}

impl From<Error> for ApiError {
    fn from(source: Error) -> Self {
        Self::Upstream {
            context: "Upstream request failed",
            source,
        }
    }
}

/// JSON error response body.
#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Upstream {
                source: Error::Configuration(msg),
                context,
            } => {
                tracing::warn!(context, error = %msg, "service not configured");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse {
                        error: msg,
                        message: None,
                        details: None,
                    },
                )
            }
            Self::Upstream { context, source } => {
                tracing::error!(context, error = %source, "upstream failure");
                let failure = source.upstream();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: context.to_string(),
                        message: failure.map(|f| f.message.clone()),
                        details: failure.and_then(|f| f.detail.clone()),
                    },
                )
            }
            Self::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error: msg,
                    message: None,
                    details: None,
                },
            ),
            Self::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: msg,
                    message: None,
                    details: None,
                },
            ),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorResponse {
                    error: "Too many requests from this IP, please try again later.".to_string(),
                    message: None,
                    details: None,
                },
            ),
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "internal_error".to_string(),
                        message: Some("An internal error occurred".to_string()),
                        details: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamepulse_core::UpstreamFailure;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn configuration_error_is_service_unavailable() {
        let err = ApiError::upstream("Failed to fetch trending games")(Error::Configuration(
            "RAWG API key not configured".to_string(),
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!({"error": "RAWG API key not configured"}));
    }

    #[tokio::test]
    async fn upstream_fetch_error_carries_detail() {
        let err = ApiError::upstream("Failed to fetch game details")(Error::UpstreamFetch(
            UpstreamFailure {
                status: Some(404),
                message: "upstream returned Not Found".to_string(),
                detail: Some("Not found.".to_string()),
            },
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Failed to fetch game details");
        assert_eq!(body["message"], "upstream returned Not Found");
        assert_eq!(body["details"], "Not found.");
    }

    #[tokio::test]
    async fn upstream_auth_error_is_internal() {
        let err: ApiError = Error::UpstreamAuth(UpstreamFailure::transport("timed out")).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Upstream request failed");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn session_and_client_errors() {
        let response = ApiError::Unauthorized("Invalid refresh token".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "Invalid refresh token");

        let response = ApiError::BadRequest("Google token is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError::RateLimited.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn error_display() {
        let err = ApiError::Internal(anyhow::anyhow!("something broke"));
        assert_eq!(err.to_string(), "internal error: something broke");
    }
}
