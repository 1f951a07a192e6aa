//! Error types for the HTTP API.
//!
//! Every handler returns `Result<_, ApiError>`; the conversion to a status
//! code and `{ "error": ... }` body happens once, here.
//!
//! ```text
//! CoreError::Validation        → 400 + details
//! CoreError::DuplicateCollection → 409
//! CoreError::CollectionNotFound → 404
//! CoreError::MalformedInput    → 400
//! DbError::UniqueViolation     → 409
//! DbError::NotFound            → 404
//! other DbError                → 500 (logged)
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use coinbox_core::{CoreError, FieldErrors};
use coinbox_db::DbError;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body or query failed field validation.
    #[error("{message}")]
    Validation {
        message: &'static str,
        details: FieldErrors,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Service unavailable")]
    Unavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Field errors from a create or update body.
    pub fn invalid_body(details: FieldErrors) -> Self {
        ApiError::Validation {
            message: "Validation failed",
            details,
        }
    }

    /// Field errors from list query parameters.
    pub fn invalid_query(details: FieldErrors) -> Self {
        ApiError::Validation {
            message: "Invalid query parameters",
            details,
        }
    }

    pub fn collection_not_found() -> Self {
        ApiError::NotFound("Collection not found".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ApiError::Validation { message, details } => {
                json!({ "error": message, "details": details })
            }
            ApiError::Internal(reason) => {
                error!(%reason, "Request failed");
                json!({ "error": "Internal server error" })
            }
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation(details) => ApiError::invalid_body(details),
            dup @ CoreError::DuplicateCollection { .. } => ApiError::Conflict(dup.to_string()),
            CoreError::CollectionNotFound(_) => ApiError::collection_not_found(),
            CoreError::MalformedInput(message) => ApiError::BadRequest(message),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(error: DbError) -> Self {
        match error {
            // The UNIQUE index caught a duplicate the pre-check raced past
            DbError::UniqueViolation { .. } => ApiError::Conflict(
                "A collection already exists for this date, round, and location".to_string(),
            ),
            DbError::NotFound { entity, .. } if entity == "Collection" => {
                ApiError::collection_not_found()
            }
            DbError::NotFound { entity, .. } => ApiError::NotFound(format!("{entity} not found")),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
