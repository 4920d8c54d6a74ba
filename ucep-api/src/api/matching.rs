//! Match scoring and fairness endpoints

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use ucep_common::matching::{FairnessReport, MatchScore};

use crate::error::{parse_guid, ApiResult};
use crate::services::matching::{
    self as service, clamp_limit, CandidateMatch, HousingMatch, JobMatch, RoommateMatch,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PairQuery {
    pub a: String,
    pub b: String,
}

/// GET /api/jobs/:id/match/:user_id
pub async fn job_match(
    State(state): State<AppState>,
    Path((job_id, user_id)): Path<(String, String)>,
) -> ApiResult<Json<MatchScore>> {
    let job_id = parse_guid(&job_id, "job")?;
    let user_id = parse_guid(&user_id, "user")?;
    Ok(Json(service::job_match(&state.db, &user_id, &job_id).await?))
}

/// GET /api/users/:id/job-matches?limit=
pub async fn job_matches_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<JobMatch>>> {
    let user_id = parse_guid(&user_id, "user")?;
    let matches =
        service::ranked_jobs_for_user(&state.db, &user_id, clamp_limit(query.limit)).await?;
    Ok(Json(matches))
}

/// GET /api/jobs/:id/candidates
pub async fn candidates_for_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Vec<CandidateMatch>>> {
    let job_id = parse_guid(&job_id, "job")?;
    Ok(Json(service::ranked_candidates_for_job(&state.db, &job_id).await?))
}

/// GET /api/roommates/compatibility?a=&b=
pub async fn roommate_compatibility(
    State(state): State<AppState>,
    Query(query): Query<PairQuery>,
) -> ApiResult<Json<MatchScore>> {
    let a = parse_guid(&query.a, "user")?;
    let b = parse_guid(&query.b, "user")?;
    Ok(Json(service::roommate_compatibility(&state.db, &a, &b).await?))
}

/// GET /api/users/:id/roommate-matches?limit=
pub async fn roommate_matches(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<RoommateMatch>>> {
    let user_id = parse_guid(&user_id, "user")?;
    let matches = service::ranked_roommates(&state.db, &user_id, clamp_limit(query.limit)).await?;
    Ok(Json(matches))
}

/// GET /api/users/:id/housing-matches?limit=
pub async fn housing_matches(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<HousingMatch>>> {
    let user_id = parse_guid(&user_id, "user")?;
    let matches = service::ranked_housing(&state.db, &user_id, clamp_limit(query.limit)).await?;
    Ok(Json(matches))
}

/// GET /api/jobs/:id/fairness
pub async fn job_fairness(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<FairnessReport>> {
    let job_id = parse_guid(&job_id, "job")?;
    Ok(Json(service::job_fairness(&state.db, &job_id).await?))
}

pub fn matching_routes() -> Router<AppState> {
    Router::new()
        .route("/api/jobs/:id/match/:user_id", get(job_match))
        .route("/api/jobs/:id/candidates", get(candidates_for_job))
        .route("/api/jobs/:id/fairness", get(job_fairness))
        .route("/api/users/:id/job-matches", get(job_matches_for_user))
        .route("/api/users/:id/roommate-matches", get(roommate_matches))
        .route("/api/users/:id/housing-matches", get(housing_matches))
        .route("/api/roommates/compatibility", get(roommate_compatibility))
}
