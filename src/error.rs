use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use validator::ValidationErrors;

use crate::domain::errors::LinkError;

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: ErrorInfo,
}

#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug)]
pub enum AppError {
    Validation { message: String, details: Value },
    NotFound { message: String, details: Value },
    Gone { message: String, details: Value },
    Conflict { message: String, details: Value },
    Unavailable { message: String, details: Value },
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn validation(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn gone(message: impl Into<String>, details: Value) -> Self {
        Self::Gone {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::Unavailable {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Gone { .. } => StatusCode::GONE,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_error_info(&self) -> ErrorInfo {
        let (code, message, details) = match self {
            AppError::Validation { message, details } => ("validation_error", message, details),
            AppError::NotFound { message, details } => ("not_found", message, details),
            AppError::Gone { message, details } => ("gone", message, details),
            AppError::Conflict { message, details } => ("conflict", message, details),
            AppError::Unavailable { message, details } => ("unavailable", message, details),
            AppError::Internal { message, details } => ("internal_error", message, details),
        };

        ErrorInfo {
            code,
            message: message.clone(),
            details: details.clone(),
        }
    }
}

/// Boundary mapping from domain failures to HTTP errors.
///
/// | `LinkError`                              | Status |
/// |------------------------------------------|--------|
/// | `InvalidUrl`, `InvalidShortCode`         | 422    |
/// | `DuplicateCode`                          | 409    |
/// | `GenerationExhausted`                    | 503    |
/// | `NotFound`                               | 404    |
/// | `Expired`                                | 410    |
/// | `Storage`                                | 500    |
impl From<LinkError> for AppError {
    fn from(err: LinkError) -> Self {
        let message = err.to_string();
        match err {
            LinkError::InvalidUrl(e) => {
                AppError::validation(message, json!({ "field": "url", "reason": e.to_string() }))
            }
            LinkError::InvalidShortCode(e) => AppError::validation(
                message,
                json!({ "field": "custom_code", "reason": e.to_string() }),
            ),
            LinkError::DuplicateCode(code) => AppError::conflict(message, json!({ "code": code })),
            LinkError::GenerationExhausted(attempts) => {
                AppError::unavailable(message, json!({ "attempts": attempts }))
            }
            LinkError::NotFound(code) => AppError::not_found(message, json!({ "code": code })),
            LinkError::Expired(code) => AppError::gone(message, json!({ "code": code })),
            LinkError::Storage(reason) => {
                tracing::error!(error = %reason, "Storage failure");
                AppError::internal("Internal server error", json!({}))
            }
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages: Vec<String> = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                (field.to_string(), json!(messages))
            })
            .collect::<serde_json::Map<_, _>>();

        AppError::validation("Validation failed", Value::Object(details))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            success: false,
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}
