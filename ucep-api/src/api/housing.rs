//! Housing listing endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use ucep_common::db::HousingListing;

use crate::db;
use crate::db::housing::NewListing;
use crate::error::{parse_guid, ApiResult};
use crate::pagination::{Page, PageQuery};
use crate::AppState;

/// POST /api/housing
pub async fn create_listing(
    State(state): State<AppState>,
    Json(mut request): Json<NewListing>,
) -> ApiResult<(StatusCode, Json<HousingListing>)> {
    request.owner_id = parse_guid(&request.owner_id, "owner")?;
    let listing = db::housing::create_listing(&state.db, &request).await?;
    db::audit::record(
        &state.db,
        Some(&listing.owner_id),
        "housing.created",
        Some(("housing_listing", &listing.guid)),
        None,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(listing)))
}

/// GET /api/housing?page=
pub async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<HousingListing>>> {
    Ok(Json(db::housing::list_listings(&state.db, query.page).await?))
}

pub fn housing_routes() -> Router<AppState> {
    Router::new().route("/api/housing", get(list_listings).post(create_listing))
}
