//! Job posting endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use ucep_common::db::{Job, JobStatus};

use crate::db;
use crate::db::jobs::NewJob;
use crate::error::{parse_guid, ApiError, ApiResult};
use crate::pagination::Page;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct JobListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    pub status: Option<String>,
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

fn parse_status(raw: &str) -> ApiResult<JobStatus> {
    raw.trim()
        .to_lowercase()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid job status: {}", raw)))
}

/// POST /api/jobs
pub async fn create_job(
    State(state): State<AppState>,
    Json(mut request): Json<NewJob>,
) -> ApiResult<(StatusCode, Json<Job>)> {
    request.employer_id = parse_guid(&request.employer_id, "employer")?;
    let job = db::jobs::create_job(&state.db, &request).await?;

    db::audit::record(
        &state.db,
        Some(&job.employer_id),
        "job.created",
        Some(("job", &job.guid)),
        Some(&json!({"title": job.title})),
    )
    .await?;

    info!(job_id = %job.guid, "Job posted");
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/jobs?page=&status=
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> ApiResult<Json<Page<Job>>> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    Ok(Json(db::jobs::list_jobs(&state.db, status, query.page).await?))
}

/// GET /api/jobs/:id
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Job>> {
    let id = parse_guid(&id, "job")?;
    Ok(Json(db::jobs::require_job(&state.db, &id).await?))
}

/// PUT /api/jobs/:id/status
pub async fn update_job_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<Json<Job>> {
    let id = parse_guid(&id, "job")?;
    let status = parse_status(&update.status)?;

    let job = db::jobs::set_job_status(&state.db, &id, status).await?;
    db::audit::record(
        &state.db,
        None,
        "job.status_changed",
        Some(("job", &id)),
        Some(&json!({"status": status.as_str()})),
    )
    .await?;

    Ok(Json(job))
}

/// DELETE /api/jobs/:id
pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_guid(&id, "job")?;
    db::jobs::delete_job(&state.db, &id).await?;
    db::audit::record(&state.db, None, "job.deleted", Some(("job", &id)), None).await?;

    info!(job_id = %id, "Job deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/api/jobs", get(list_jobs).post(create_job))
        .route("/api/jobs/:id", get(get_job).delete(delete_job))
        .route("/api/jobs/:id/status", put(update_job_status))
}
