//! Badge endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use ucep_common::db::{Badge, BadgeAward};

use crate::db;
use crate::error::{parse_guid, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NewBadge {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct AwardRequest {
    pub user_id: String,
}

/// POST /api/badges
pub async fn create_badge(
    State(state): State<AppState>,
    Json(request): Json<NewBadge>,
) -> ApiResult<(StatusCode, Json<Badge>)> {
    let badge = db::badges::create_badge(&state.db, &request.name, &request.description).await?;
    Ok((StatusCode::CREATED, Json(badge)))
}

/// POST /api/badges/:id/award
pub async fn award_badge(
    State(state): State<AppState>,
    Path(badge_id): Path<String>,
    Json(request): Json<AwardRequest>,
) -> ApiResult<(StatusCode, Json<BadgeAward>)> {
    let badge_id = parse_guid(&badge_id, "badge")?;
    let user_id = parse_guid(&request.user_id, "user")?;

    let award = db::badges::award_badge(&state.db, &badge_id, &user_id).await?;
    db::audit::record(
        &state.db,
        None,
        "badge.awarded",
        Some(("user", &user_id)),
        Some(&serde_json::json!({"badge": award.badge_name})),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(award)))
}

/// GET /api/users/:id/badges
pub async fn user_badges(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<BadgeAward>>> {
    let user_id = parse_guid(&user_id, "user")?;
    db::users::require_user(&state.db, &user_id).await?;
    Ok(Json(db::badges::list_user_badges(&state.db, &user_id).await?))
}

pub fn badge_routes() -> Router<AppState> {
    Router::new()
        .route("/api/badges", post(create_badge))
        .route("/api/badges/:id/award", post(award_badge))
        .route("/api/users/:id/badges", get(user_badges))
}
