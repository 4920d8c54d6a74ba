//! Authentication middleware for admin routes
//!
//! POST/PUT requests carry `timestamp` and `hash` in their JSON body; other
//! methods carry them in the query string. See `ucep_common::api::auth`.

use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;
use ucep_common::api::{validate_hash, validate_timestamp, ApiAuthError, AuthQuery};

use crate::AppState;

/// Largest request body read for hash validation
const MAX_AUTH_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Deserialize)]
struct AuthFields {
    timestamp: i64,
    hash: String,
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // Secret 0 disables checking
    if state.shared_secret == 0 {
        return Ok(next.run(request).await);
    }

    let carries_body = matches!(*request.method(), Method::POST | Method::PUT | Method::PATCH);

    if !carries_body {
        let Query(auth) = Query::<AuthQuery>::try_from_uri(request.uri())
            .map_err(|e| AuthError::MissingFields(e.body_text()))?;

        check(&auth.to_value(), auth.timestamp, &auth.hash, state.shared_secret)?;
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, MAX_AUTH_BODY_BYTES)
        .await
        .map_err(|e| AuthError::ParseError(format!("Failed to read body: {}", e)))?;

    let json_value: Value = serde_json::from_slice(&body_bytes)
        .map_err(|e| AuthError::ParseError(format!("Invalid JSON: {}", e)))?;

    let fields: AuthFields = serde_json::from_value(json_value.clone())
        .map_err(|e| AuthError::MissingFields(e.to_string()))?;

    check(&json_value, fields.timestamp, &fields.hash, state.shared_secret)?;

    // Handlers still need the body
    let request = Request::from_parts(parts, Body::from(body_bytes));
    Ok(next.run(request).await)
}

fn check(value: &Value, timestamp: i64, hash: &str, shared_secret: i64) -> Result<(), AuthError> {
    validate_timestamp(timestamp).map_err(|e| match e {
        ApiAuthError::InvalidTimestamp { reason, .. } => AuthError::InvalidTimestamp(reason),
        other => AuthError::Other(other.to_string()),
    })?;

    validate_hash(hash, value, shared_secret).map_err(|e| match e {
        ApiAuthError::InvalidHash { provided, calculated } => {
            warn!("Hash validation failed: provided={}, calculated={}", provided, calculated);
            AuthError::InvalidHash
        }
        other => AuthError::Other(other.to_string()),
    })
}

#[derive(Debug)]
pub enum AuthError {
    InvalidTimestamp(String),
    InvalidHash,
    MissingFields(String),
    ParseError(String),
    Other(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthError::InvalidTimestamp(reason) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                format!("Invalid timestamp: {}", reason),
            ),
            AuthError::InvalidHash => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Invalid hash".to_string())
            }
            AuthError::MissingFields(msg) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                format!("Missing authentication fields: {}", msg),
            ),
            AuthError::ParseError(msg) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                format!("Parse error: {}", msg),
            ),
            AuthError::Other(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                format!("Authentication error: {}", msg),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
