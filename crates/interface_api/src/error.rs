//! API error handling

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use validator::ValidationErrors;

use domain_claims::ClaimError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        fields: Vec<String>,
    },

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_type, message, details) = match self {
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthorized => ("unauthorized", "Unauthorized".to_string(), None),
            ApiError::Forbidden(msg) => ("forbidden", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::Validation { message, fields } => {
                ("validation_error", message, (!fields.is_empty()).then_some(fields))
            }
            ApiError::Unavailable(msg) => ("service_unavailable", msg, None),
            ApiError::Internal(msg) => ("internal_error", msg, None),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Domain errors carry the user-facing text; the technical detail is logged
impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        let message = err.user_message();
        match err {
            ClaimError::Validation { fields } => ApiError::Validation { message, fields },
            ClaimError::InvalidTransition { ref from, ref to } => {
                warn!(from = %from, to = %to, "rejected status transition");
                ApiError::Conflict(message)
            }
            ClaimError::ClaimNotFound(_) => ApiError::NotFound(message),
            ClaimError::Forbidden(ref reason) => {
                warn!(reason = %reason, "forbidden claim operation");
                ApiError::Forbidden(message)
            }
            ClaimError::PhotoLimitReached(_) => ApiError::Validation {
                message,
                fields: vec!["photos".to_string()],
            },
            ClaimError::Transport(ref source) => {
                error!(error = %source, "claims backend failure");
                ApiError::Unavailable(message)
            }
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort();
        ApiError::Validation {
            message: format!("Please check: {}", fields.join(", ")),
            fields,
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}
