use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

use stockroom_core::ValidationError;
use stockroom_store::StoreError;

/// Handler-facing error; each variant owns its HTTP translation.
///
/// Validation failures carry every violated field, duplicates name the
/// contested key, and backend failures are logged server-side while the
/// response body stays generic.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Store(StoreError),
}

impl ApiError {
    pub fn duplicate(field: &'static str, value: impl Into<String>) -> Self {
        Self::Duplicate {
            field,
            value: value.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { field, value } => Self::Duplicate { field, value },
            other => Self::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                axum::Json(json!({
                    "error": "validation_error",
                    "message": "validation failed",
                    "fields": err.fields(),
                })),
            )
                .into_response(),
            ApiError::NotFound(what) => json_error(
                StatusCode::NOT_FOUND,
                "not_found",
                format!("{what} not found"),
            ),
            ApiError::Duplicate { field, value } => json_error(
                StatusCode::CONFLICT,
                "duplicate_key",
                format!("{field} '{value}' is already taken"),
            ),
            ApiError::InvalidCredentials => json_error(
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "invalid username or password",
            ),
            ApiError::Internal(detail) => {
                tracing::error!("internal error: {detail}");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error",
                )
            }
            ApiError::Store(err) => {
                tracing::error!("store error: {err}");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "store_error",
                    "internal server error",
                )
            }
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
