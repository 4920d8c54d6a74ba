//! Scholarship endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use ucep_common::db::Scholarship;

use crate::db;
use crate::db::scholarships::NewScholarship;
use crate::error::{parse_guid, ApiResult};
use crate::pagination::{Page, PageQuery};
use crate::services::eligibility::eligible_scholarships;
use crate::AppState;

/// POST /api/scholarships
pub async fn create_scholarship(
    State(state): State<AppState>,
    Json(request): Json<NewScholarship>,
) -> ApiResult<(StatusCode, Json<Scholarship>)> {
    let scholarship = db::scholarships::create_scholarship(&state.db, &request).await?;
    db::audit::record(
        &state.db,
        None,
        "scholarship.created",
        Some(("scholarship", &scholarship.guid)),
        None,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(scholarship)))
}

/// GET /api/scholarships?page=
pub async fn list_scholarships(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<Scholarship>>> {
    Ok(Json(db::scholarships::list_scholarships(&state.db, query.page).await?))
}

/// GET /api/users/:id/eligible-scholarships
pub async fn eligible_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<Scholarship>>> {
    let user_id = parse_guid(&user_id, "user")?;
    let today = Utc::now().date_naive();
    Ok(Json(eligible_scholarships(&state.db, &user_id, today).await?))
}

pub fn scholarship_routes() -> Router<AppState> {
    Router::new()
        .route("/api/scholarships", get(list_scholarships).post(create_scholarship))
        .route("/api/users/:id/eligible-scholarships", get(eligible_for_user))
}
