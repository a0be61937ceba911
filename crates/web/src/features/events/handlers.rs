use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::dto::{
    common::PaginatedResponse,
    event::{CreateEventRequest, EventDetailResponse, EventResponse, PublicEventFilter},
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/events",
    params(PublicEventFilter),
    responses(
        (status = 200, description = "Upcoming events", body = PaginatedResponse<EventResponse>),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "events"
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(filter): Query<PublicEventFilter>,
) -> Result<Response, WebError> {
    filter.validate().map_err(WebError::BadRequest)?;

    let page = services::list_public_events(state.db.pool(), &filter).await?;

    Ok(Json(page).into_response())
}

#[utoipa::path(
    get,
    path = "/api/events/{id}",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event found", body = EventResponse),
        (status = 404, description = "Event not found")
    ),
    tag = "events"
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EventResponse>, WebError> {
    let event = services::get_event(state.db.pool(), id).await?;

    Ok(Json(event))
}

#[utoipa::path(
    get,
    path = "/api/admin/events/{id}",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Event with target sectors", body = EventDetailResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Event not found")
    ),
    tag = "admin"
)]
pub async fn get_event_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EventDetailResponse>, WebError> {
    let event = services::get_event_detail(state.db.pool(), id).await?;

    Ok(Json(event))
}

#[utoipa::path(
    post,
    path = "/api/admin/events",
    request_body = CreateEventRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Event created successfully", body = EventDetailResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Unknown target sector")
    ),
    tag = "admin"
)]
pub async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    req.validate_targets()
        .map_err(|e| WebError::BadRequest(e.to_string()))?;

    let event = services::create_event(state.db.pool(), &req).await?;

    Ok((StatusCode::CREATED, Json(event)).into_response())
}
