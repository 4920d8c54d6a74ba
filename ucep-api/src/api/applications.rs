//! Job application endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use ucep_common::db::{ApplicationStatus, JobApplication, JobStatus};

use crate::db;
use crate::error::{parse_guid, ApiError, ApiResult};
use crate::services::matching::job_match;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// POST /api/jobs/:id/applications
///
/// Stores the match score computed at submission time.
pub async fn apply(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(request): Json<ApplyRequest>,
) -> ApiResult<(StatusCode, Json<JobApplication>)> {
    let job_id = parse_guid(&job_id, "job")?;
    let user_id = parse_guid(&request.user_id, "user")?;

    let job = db::jobs::require_job(&state.db, &job_id).await?;
    if job.status != JobStatus::Open {
        return Err(ApiError::Conflict(format!("Job {} is closed", job_id)));
    }

    let score = job_match(&state.db, &user_id, &job_id).await?;
    let application =
        db::applications::create_application(&state.db, &job_id, &user_id, score.score).await?;

    db::audit::record(
        &state.db,
        Some(&user_id),
        "application.submitted",
        Some(("application", &application.guid)),
        Some(&json!({"job_id": job_id, "match_score": score.score})),
    )
    .await?;

    info!(
        application_id = %application.guid,
        match_score = score.score,
        "Application submitted"
    );
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/jobs/:id/applications
pub async fn list_applications(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Vec<JobApplication>>> {
    let job_id = parse_guid(&job_id, "job")?;
    db::jobs::require_job(&state.db, &job_id).await?;
    Ok(Json(db::applications::list_for_job(&state.db, &job_id).await?))
}

/// PUT /api/applications/:id/status
pub async fn update_application_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<Json<JobApplication>> {
    let id = parse_guid(&id, "application")?;
    let status: ApplicationStatus = update
        .status
        .trim()
        .to_lowercase()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid application status: {}", update.status)))?;

    let application = db::applications::set_application_status(&state.db, &id, status).await?;
    db::audit::record(
        &state.db,
        None,
        "application.status_changed",
        Some(("application", &id)),
        Some(&json!({"status": status.as_str()})),
    )
    .await?;

    Ok(Json(application))
}

pub fn application_routes() -> Router<AppState> {
    Router::new()
        .route("/api/jobs/:id/applications", get(list_applications).post(apply))
        .route("/api/applications/:id/status", put(update_application_status))
}
