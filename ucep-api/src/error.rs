//! Error types for ucep-api
//!
//! Every handler returns [`ApiResult`]. Errors render as
//! `{"error": {"code": ..., "message": ...}}` with a matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409), e.g. duplicate email or a full event
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// ucep-common error
    #[error(transparent)]
    Common(#[from] ucep_common::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Common(ucep_common::Error::Database(err))
    }
}

/// Map constraint violations to client errors; anything else is a 500
fn classify_database_error(err: &sqlx::Error) -> (StatusCode, &'static str) {
    if let sqlx::Error::Database(db_err) = err {
        if db_err.is_unique_violation() {
            return (StatusCode::CONFLICT, "CONFLICT");
        }
        if db_err.is_foreign_key_violation() {
            return (StatusCode::BAD_REQUEST, "INVALID_REFERENCE");
        }
        if db_err.is_check_violation() {
            return (StatusCode::BAD_REQUEST, "BAD_REQUEST");
        }
    }
    if matches!(err, sqlx::Error::RowNotFound) {
        return (StatusCode::NOT_FOUND, "NOT_FOUND");
    }
    (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
            ApiError::Common(err) => match err {
                ucep_common::Error::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
                ucep_common::Error::InvalidInput(msg) => {
                    (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
                }
                ucep_common::Error::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
                ucep_common::Error::Database(ref db_err) => {
                    let (status, code) = classify_database_error(db_err);
                    (status, code, db_err.to_string())
                }
                other => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COMMON_ERROR",
                    other.to_string(),
                ),
            },
        };

        if status.is_server_error() {
            error!(code = error_code, "Request failed: {}", message);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Parse a path or body identifier as a UUID
pub fn parse_guid(value: &str, what: &str) -> ApiResult<String> {
    uuid::Uuid::parse_str(value)
        .map(|u| u.to_string())
        .map_err(|_| ApiError::BadRequest(format!("Malformed {} id: {}", what, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::NotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(ucep_common::Error::InvalidInput("bad".into()))
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(sqlx::Error::RowNotFound).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(ucep_common::Error::Internal("boom".into()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_parse_guid() {
        let id = uuid::Uuid::new_v4().to_string();
        assert_eq!(parse_guid(&id.to_uppercase(), "user").unwrap(), id);
        assert!(matches!(parse_guid("nope", "user"), Err(ApiError::BadRequest(_))));
    }
}
