//! Shared HTTP API primitives
//!
//! Framework-free pieces of request authentication. The axum middleware
//! wrapping them lives in `ucep-api`.

pub mod auth;

pub use auth::{
    calculate_hash, canonical_json, initialize_shared_secret, load_shared_secret,
    validate_hash, validate_timestamp, ApiAuthError, AuthQuery,
};
