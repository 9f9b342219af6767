//! API errors with JSON bodies.
//!
//! Handlers return [`ApiError`]. The body is completed with the request id
//! by the request-id middleware, giving `{"error": ..., "request_id": ...}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use guru_agent::AgentError;
use serde::Serialize;

/// Error body sent to clients.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub request_id: Option<String>,
}

/// Marker left on error responses so the middleware can add the request id.
#[derive(Debug, Clone)]
pub struct ErrorMessage(pub String);

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No token provided")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        if err.is_client_error() {
            return Self::BadRequest(err.to_string());
        }
        match err {
            AgentError::NoBackendAvailable | AgentError::CapabilityNotAvailable(_) => {
                Self::Unavailable(err.to_string())
            }
            AgentError::Timeout { .. } => Self::Timeout(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: message.clone(),
            request_id: None,
        };
        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(ErrorMessage(message));
        response
    }
}
