use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::dto::sector::{CreateSectorRequest, SectorResponse};
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/sectors",
    responses(
        (status = 200, description = "All sectors, by name", body = Vec<SectorResponse>)
    ),
    tag = "sectors"
)]
pub async fn list_sectors(State(state): State<AppState>) -> Result<Json<Vec<SectorResponse>>, WebError> {
    let sectors = services::list_sectors(state.db.pool()).await?;

    Ok(Json(sectors))
}

#[utoipa::path(
    post,
    path = "/api/admin/sectors",
    request_body = CreateSectorRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Sector created", body = SectorResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
        (status = 409, description = "Sector name already exists")
    ),
    tag = "admin"
)]
pub async fn create_sector(
    State(state): State<AppState>,
    Json(req): Json<CreateSectorRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let sector = services::create_sector(state.db.pool(), &req).await?;

    Ok((StatusCode::CREATED, Json(sector)).into_response())
}
