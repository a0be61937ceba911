use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::dto::{
    common::PaginatedResponse,
    participation::{AdminRequestFilter, ParticipationRequestDetail, ReviewRequest},
};
use uuid::Uuid;

use crate::error::WebError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    post,
    path = "/api/participation/events/{event_id}/participate",
    params(
        ("event_id" = Uuid, Path, description = "Event ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Participation request created (PENDING)", body = ParticipationRequestDetail),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "An active request already exists")
    ),
    tag = "participation"
)]
pub async fn apply(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let request = services::apply(state.db.pool(), user.user_id, event_id).await?;

    Ok((StatusCode::CREATED, Json(request)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/participation/me/requests",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Requests of the caller, newest first", body = Vec<ParticipationRequestDetail>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "participation"
)]
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ParticipationRequestDetail>>, WebError> {
    let requests = services::list_mine(state.db.pool(), user.user_id).await?;

    Ok(Json(requests))
}

#[utoipa::path(
    get,
    path = "/api/admin/participation-requests",
    params(AdminRequestFilter),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paginated participation requests", body = PaginatedResponse<ParticipationRequestDetail>),
        (status = 400, description = "Invalid query parameters"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required")
    ),
    tag = "admin"
)]
pub async fn list_admin(
    State(state): State<AppState>,
    Query(filter): Query<AdminRequestFilter>,
) -> Result<Response, WebError> {
    filter.validate().map_err(WebError::BadRequest)?;

    let page = services::list_admin(state.db.pool(), &filter).await?;

    Ok(Json(page).into_response())
}

#[utoipa::path(
    patch,
    path = "/api/admin/participation-requests/{id}",
    params(
        ("id" = Uuid, Path, description = "Participation request ID")
    ),
    request_body = ReviewRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Request reviewed", body = ParticipationRequestDetail),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Participation request not found")
    ),
    tag = "admin"
)]
pub async fn review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ReviewRequest>,
) -> Result<Response, WebError> {
    let request = services::review(state.db.pool(), id, body.status).await?;

    Ok(Json(request).into_response())
}
