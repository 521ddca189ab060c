//! Error types for the chat server.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gemini_chat_model::ModelError;
use gemini_chat_protocol::GENERATION_FAILED_MESSAGE;
use serde::Serialize;
use thiserror::Error;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Upstream model failed.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Upstream model did not answer in time.
    #[error("Request timeout")]
    Timeout,

    /// Service unavailable.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Provider(_) => StatusCode::BAD_GATEWAY,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get the error code string.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Provider(_) => "provider_error",
            Self::Timeout => "timeout",
            Self::Unavailable(_) => "service_unavailable",
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail. The request id travels in the `X-Request-Id` header.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
        };

        (self.status_code(), Json(body)).into_response()
    }
}

/// Result type for the chat server.
pub type AppResult<T> = Result<T, AppError>;

/// Upstream detail stays in the logs; clients only see the static message.
impl From<ModelError> for AppError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::MissingApiKey => Self::Unavailable("model is not configured".to_string()),
            e if e.is_timeout() => Self::Timeout,
            _ => Self::Provider(GENERATION_FAILED_MESSAGE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::NotFound("test".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Provider("test".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(AppError::Timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_model_errors_hide_upstream_detail() {
        let error = AppError::from(ModelError::Api {
            status: 400,
            message: "API key not valid".into(),
        });
        assert_eq!(error.error_code(), "provider_error");
        assert!(!error.to_string().contains("API key"));
        assert!(error.to_string().contains(GENERATION_FAILED_MESSAGE));
    }

    #[test]
    fn test_model_error_mapping() {
        assert!(matches!(
            AppError::from(ModelError::MissingApiKey),
            AppError::Unavailable(_)
        ));
        assert!(matches!(
            AppError::from(ModelError::Timeout(60)),
            AppError::Timeout
        ));
        assert!(matches!(
            AppError::from(ModelError::Upstream("boom".into())),
            AppError::Provider(_)
        ));
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        use http_body_util::BodyExt;

        let response = AppError::Timeout.into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": {"code": "timeout", "message": "Request timeout"}})
        );
    }
}
