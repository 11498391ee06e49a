//! Application error type and HTTP mapping.
//!
//! Every handler and service returns [`Result`]; the [`IntoResponse`] impl
//! renders the stable `{success: false, message, errors?}` body so callers
//! (including the public status page) never see internal error detail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Field-level validation detail returned to the caller
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input: unknown enum value, empty required set, non-owned
    /// referenced entity. Carries field-level detail.
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    /// Uniqueness violation (duplicate slug, access code, membership).
    #[error("{message}")]
    Conflict { field: String, message: String },

    /// Persistence timeout or unavailable backend; safe to retry.
    #[error("{0}")]
    ServiceUnavailable(String),

    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Single-field validation error
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        AppError::Validation {
            message: message.clone(),
            errors: vec![FieldError {
                field: field.to_string(),
                message,
            }],
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::Validation { message, errors } => {
                (StatusCode::BAD_REQUEST, message, Some(errors))
            }
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message, None),
            AppError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message, None),
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, message, None),
            AppError::Conflict { field, message } => (
                StatusCode::CONFLICT,
                message.clone(),
                Some(vec![FieldError {
                    field,
                    message,
                }]),
            ),
            AppError::ServiceUnavailable(message) => {
                (StatusCode::SERVICE_UNAVAILABLE, message, None)
            }
            AppError::Database(err) => {
                if is_transient(&err) {
                    tracing::warn!("database temporarily unavailable: {}", err);
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "Service temporarily unavailable, please retry".to_string(),
                        None,
                    )
                } else {
                    tracing::error!("database error: {}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                        None,
                    )
                }
            }
            AppError::Internal(message) => {
                tracing::error!("internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            success: false,
            message,
            errors,
        };
        (status, Json(body)).into_response()
    }
}

/// Connection-level failures are retriable; everything else is not.
fn is_transient(err: &sea_orm::DbErr) -> bool {
    matches!(
        err,
        sea_orm::DbErr::Conn(_) | sea_orm::DbErr::ConnectionAcquire(_)
    )
}
