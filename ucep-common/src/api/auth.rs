//! Admin request authentication via timestamp and hash
//!
//! Every protected request carries `timestamp` (Unix epoch ms) and `hash`
//! (SHA-256, 64 hex chars). The hash covers the canonical JSON form of the
//! request (sorted keys, no whitespace, `hash` replaced by 64 zeros) with the
//! decimal shared secret appended. A shared secret of 0 disables checking.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Settings key holding the shared secret
pub const SHARED_SECRET_KEY: &str = "api_shared_secret";

/// Accepted timestamp age in milliseconds
pub const MAX_PAST_MS: i64 = 1000;

/// Accepted clock drift into the future in milliseconds
pub const MAX_FUTURE_MS: i64 = 1;

const DUMMY_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Debug, Clone, Error)]
pub enum ApiAuthError {
    #[error("Invalid timestamp: {reason}")]
    InvalidTimestamp { timestamp: i64, now: i64, reason: String },

    #[error("Invalid hash")]
    InvalidHash { provided: String, calculated: String },

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Authentication fields for GET requests (query string)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthQuery {
    pub timestamp: i64,
    pub hash: String,
}

impl AuthQuery {
    /// JSON form the hash of a query-authenticated request is computed over
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "timestamp": self.timestamp,
            "hash": self.hash,
        })
    }
}

/// Load the shared secret, generating and storing one if absent
pub async fn load_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    let stored: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(SHARED_SECRET_KEY)
            .fetch_optional(db)
            .await
            .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    match stored.flatten() {
        Some(value) => value
            .trim()
            .parse::<i64>()
            .map_err(|e| ApiAuthError::DatabaseError(format!("Invalid shared secret: {}", e))),
        None => initialize_shared_secret(db).await,
    }
}

/// Generate a random non-zero secret and persist it
pub async fn initialize_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let secret: i64 = loop {
        let candidate = rng.gen::<i64>();
        if candidate != 0 {
            break candidate;
        }
    };

    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(SHARED_SECRET_KEY)
    .bind(secret.to_string())
    .execute(db)
    .await
    .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    Ok(secret)
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Check a timestamp against the current clock
pub fn validate_timestamp(timestamp: i64) -> Result<(), ApiAuthError> {
    validate_timestamp_at(timestamp, now_millis())
}

/// Check a timestamp against an explicit `now`
pub fn validate_timestamp_at(timestamp: i64, now: i64) -> Result<(), ApiAuthError> {
    let Some(age) = now.checked_sub(timestamp) else {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!("Timestamp {} out of range", timestamp),
        });
    };

    if age > MAX_PAST_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!("Timestamp {}ms too old (max {}ms past)", age, MAX_PAST_MS),
        });
    }

    if age < -MAX_FUTURE_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!(
                "Timestamp {}ms in future (max {}ms future)",
                age.unsigned_abs(), MAX_FUTURE_MS
            ),
        });
    }

    Ok(())
}

/// Canonical JSON: object keys sorted at every level, no whitespace
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let items: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}:{}", Value::String(k.clone()), canonical_json(&map[k])))
                .collect();
            format!("{{{}}}", items.join(","))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        // serde_json's Display is compact and escapes strings
        other => other.to_string(),
    }
}

/// SHA-256 over canonical JSON (hash field zeroed) + decimal secret
pub fn calculate_hash(json_value: &Value, shared_secret: i64) -> String {
    let mut value = json_value.clone();
    if let Some(obj) = value.as_object_mut() {
        obj.insert("hash".to_string(), Value::String(DUMMY_HASH.to_string()));
    }

    let mut hasher = Sha256::new();
    hasher.update(canonical_json(&value).as_bytes());
    hasher.update(shared_secret.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn validate_hash(
    provided_hash: &str,
    json_value: &Value,
    shared_secret: i64,
) -> Result<(), ApiAuthError> {
    let calculated = calculate_hash(json_value, shared_secret);

    if !provided_hash.eq_ignore_ascii_case(&calculated) {
        return Err(ApiAuthError::InvalidHash {
            provided: provided_hash.to_string(),
            calculated,
        });
    }

    Ok(())
}
