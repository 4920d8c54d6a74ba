//! Event and RSVP endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use ucep_common::db::Event;

use crate::db;
use crate::db::events::NewEvent;
use crate::error::{parse_guid, ApiResult};
use crate::pagination::{Page, PageQuery};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RsvpRequest {
    pub user_id: String,
}

/// POST /api/events
pub async fn create_event(
    State(state): State<AppState>,
    Json(mut request): Json<NewEvent>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    request.created_by = parse_guid(&request.created_by, "user")?;
    let event = db::events::create_event(&state.db, &request).await?;
    db::audit::record(
        &state.db,
        Some(&event.created_by),
        "event.created",
        Some(("event", &event.guid)),
        None,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /api/events?page=
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<Event>>> {
    Ok(Json(db::events::list_events(&state.db, query.page).await?))
}

/// POST /api/events/:id/rsvp
///
/// 409 when the event is full or the user already RSVP'd.
pub async fn rsvp(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Json(request): Json<RsvpRequest>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    let event_id = parse_guid(&event_id, "event")?;
    let user_id = parse_guid(&request.user_id, "user")?;
    let event = db::events::rsvp(&state.db, &event_id, &user_id).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// DELETE /api/events/:id/rsvp/:user_id
pub async fn cancel_rsvp(
    State(state): State<AppState>,
    Path((event_id, user_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let event_id = parse_guid(&event_id, "event")?;
    let user_id = parse_guid(&user_id, "user")?;
    db::events::cancel_rsvp(&state.db, &event_id, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/api/events", get(list_events).post(create_event))
        .route("/api/events/:id/rsvp", post(rsvp))
        .route("/api/events/:id/rsvp/:user_id", delete(cancel_rsvp))
}
