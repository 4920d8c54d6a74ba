//! Admin endpoints (authenticated)

use axum::{
    body::Bytes,
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use ucep_common::db::{AuditLogEntry, DailyAnalytics};

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::jobs::{run_retention_sweep, run_rollup, SweepReport};
use crate::pagination::{Page, PageQuery};
use crate::AppState;

/// Default and maximum window for `GET /api/admin/analytics`
const DEFAULT_ANALYTICS_DAYS: u32 = 30;
const MAX_ANALYTICS_DAYS: u32 = 366;

#[derive(Debug, Default, Deserialize)]
pub struct RollupRequest {
    /// `YYYY-MM-DD`; defaults to today (UTC)
    pub day: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub days: Option<u32>,
}

/// GET /api/admin/audit-log?page=
pub async fn audit_log(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<AuditLogEntry>>> {
    Ok(Json(db::audit::list_entries(&state.db, query.page).await?))
}

/// POST /api/admin/retention/run
pub async fn run_retention(State(state): State<AppState>) -> ApiResult<Json<SweepReport>> {
    info!("Retention sweep requested via admin API");
    Ok(Json(run_retention_sweep(&state.db).await?))
}

/// POST /api/admin/analytics/rollup
///
/// The body is optional; it may carry `day` next to the auth fields.
pub async fn rollup(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<DailyAnalytics>> {
    let request: RollupRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RollupRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid rollup request: {}", e)))?
    };

    let day = match request.day.as_deref() {
        Some(day) => NaiveDate::parse_from_str(day.trim(), "%Y-%m-%d")
            .map_err(|_| ApiError::BadRequest(format!("day is not YYYY-MM-DD: {}", day)))?,
        None => Utc::now().date_naive(),
    };

    Ok(Json(run_rollup(&state.db, day).await?))
}

/// GET /api/admin/analytics?days=
pub async fn analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<Json<Vec<DailyAnalytics>>> {
    let days = query
        .days
        .unwrap_or(DEFAULT_ANALYTICS_DAYS)
        .clamp(1, MAX_ANALYTICS_DAYS);
    let today = Utc::now().date_naive();
    Ok(Json(db::analytics::list_recent(&state.db, today, days).await?))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/audit-log", get(audit_log))
        .route("/api/admin/retention/run", post(run_retention))
        .route("/api/admin/analytics/rollup", post(rollup))
        .route("/api/admin/analytics", get(analytics))
}
