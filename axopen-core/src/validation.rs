use serde::Serialize;

use crate::error::ApiError;

// ── Error types ────────────────────────────────────────────

/// A field-level validation error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub code: String,
}

/// Container for validation errors, used as the payload of `ApiError::Validation`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationErrorResponse {
    pub errors: Vec<FieldError>,
}

impl From<&garde::Report> for ValidationErrorResponse {
    fn from(report: &garde::Report) -> Self {
        let errors = report
            .iter()
            .map(|(path, error)| {
                let field = {
                    let s = path.to_string();
                    if s.is_empty() { "value".to_string() } else { s }
                };
                FieldError {
                    field,
                    message: error.message().to_string(),
                    code: "validation".to_string(),
                }
            })
            .collect();
        ValidationErrorResponse { errors }
    }
}

/// Run the type's garde rules against a freshly bound value.
pub fn validate<T>(value: &T) -> Result<(), ApiError>
where
    T: garde::Validate,
    T::Context: Default,
{
    value
        .validate()
        .map_err(|report| ApiError::Validation(ValidationErrorResponse::from(&report)))
}

// Re-export garde::Validate for convenience.
pub use garde::Validate;
