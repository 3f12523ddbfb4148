use std::sync::Arc;

use axopen_openapi::ParameterLocation;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::validation::ValidationErrorResponse;

/// Helper to create a JSON error response with a standard `{ "error": message }` body.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, Json(body)).into_response()
}

/// Rejections produced by the request pipeline before a handler runs.
pub enum ApiError {
    /// A required parameter is absent, or its raw value could not be
    /// converted to the declared schema type.
    MissingParameter {
        location: ParameterLocation,
        name: String,
    },
    SecurityRequirementsNotMet,
    /// Missing, repeated or unregistered `Content-Type`.
    ContentTypeNotSupported,
    Bind(String),
    Validation(ValidationErrorResponse),
    BodyRead(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::SecurityRequirementsNotMet => StatusCode::UNAUTHORIZED,
            ApiError::ContentTypeNotSupported => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::MissingParameter { .. }
            | ApiError::Bind(_)
            | ApiError::Validation(_)
            | ApiError::BodyRead(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Validation(resp) => {
                let body = serde_json::json!({
                    "error": "Validation failed",
                    "details": resp.errors,
                });
                (status, Json(body)).into_response()
            }
            other => error_response(status, other.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::MissingParameter { location, name } => {
                write!(f, "Required {location} parameter '{name}' is missing or invalid")
            }
            ApiError::SecurityRequirementsNotMet => {
                write!(f, "At least one required security scheme must be provided")
            }
            ApiError::ContentTypeNotSupported => {
                write!(f, "Request did not match defined content types")
            }
            ApiError::Bind(msg) => write!(f, "Bind Error: {msg}"),
            ApiError::Validation(resp) => {
                write!(f, "Validation Error: {} errors", resp.errors.len())
            }
            ApiError::BodyRead(msg) => write!(f, "Body Read Error: {msg}"),
        }
    }
}

impl std::fmt::Debug for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

impl std::error::Error for ApiError {}

/// Maps pipeline rejections to responses. The default is
/// [`ApiError::into_response`].
pub type ErrorHandler = Arc<dyn Fn(ApiError) -> Response + Send + Sync>;

pub(crate) fn default_error_handler() -> ErrorHandler {
    Arc::new(|err: ApiError| err.into_response())
}
