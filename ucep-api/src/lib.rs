//! ucep-api library: campus engagement HTTP service
//!
//! Users and profiles, job postings and applications, housing, scholarships,
//! events and badges, with fixed-weight match scoring and an authenticated
//! admin surface for audit, retention and analytics.

use axum::Router;
use sqlx::SqlitePool;
use std::time::Instant;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod jobs;
pub mod pagination;
pub mod seed;
pub mod services;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Admin API shared secret (0 disables checking)
    pub shared_secret: i64,
    pub startup_time: Instant,
}

impl AppState {
    pub fn new(db: SqlitePool, shared_secret: i64) -> Self {
        Self {
            db,
            shared_secret,
            startup_time: Instant::now(),
        }
    }
}

/// Build application router
///
/// `/api/admin/*` goes through [`api::auth_middleware`]; everything else
/// is public.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    let protected = api::admin_routes().layer(middleware::from_fn_with_state(
        state.clone(),
        api::auth_middleware,
    ));

    let public = Router::new()
        .merge(api::health_routes())
        .merge(api::user_routes())
        .merge(api::job_routes())
        .merge(api::application_routes())
        .merge(api::matching_routes())
        .merge(api::housing_routes())
        .merge(api::scholarship_routes())
        .merge(api::event_routes())
        .merge(api::badge_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
