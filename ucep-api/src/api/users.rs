//! User and profile endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::json;
use tracing::info;
use ucep_common::db::{RoommateProfileRecord, StudentProfile, User};
use ucep_common::matching::RoommateProfile;

use crate::db;
use crate::db::users::{NewUser, StudentProfileInput};
use crate::error::{parse_guid, ApiResult};
use crate::AppState;

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = db::users::create_user(&state.db, &request).await?;
    db::audit::record(
        &state.db,
        Some(&user.guid),
        "user.created",
        Some(("user", &user.guid)),
        Some(&json!({"role": user.role.as_str()})),
    )
    .await?;

    info!(user_id = %user.guid, role = user.role.as_str(), "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    let id = parse_guid(&id, "user")?;
    Ok(Json(db::users::require_user(&state.db, &id).await?))
}

/// DELETE /api/users/:id
///
/// Soft delete; the retention sweep anonymizes the row later.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_guid(&id, "user")?;

    if db::users::soft_delete_user(&state.db, &id).await? {
        db::audit::record(&state.db, Some(&id), "user.deleted", Some(("user", &id)), None).await?;
        info!(user_id = %id, "User soft-deleted");
    }

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/users/:id/profile
pub async fn put_student_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<StudentProfileInput>,
) -> ApiResult<Json<StudentProfile>> {
    let id = parse_guid(&id, "user")?;
    let profile = db::users::upsert_student_profile(&state.db, &id, &input).await?;
    Ok(Json(profile))
}

/// PUT /api/users/:id/roommate-profile
pub async fn put_roommate_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(profile): Json<RoommateProfile>,
) -> ApiResult<Json<RoommateProfileRecord>> {
    let id = parse_guid(&id, "user")?;
    let record = db::users::upsert_roommate_profile(&state.db, &id, &profile).await?;
    Ok(Json(record))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", axum::routing::post(create_user))
        .route("/api/users/:id", get(get_user).delete(delete_user))
        .route("/api/users/:id/profile", put(put_student_profile))
        .route("/api/users/:id/roommate-profile", put(put_roommate_profile))
}
