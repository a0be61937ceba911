use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use storage::dto::payment::{
    CancellationResponse, CheckoutSessionResponse, CompletionResponse, PaymentStatusResponse,
    ReferenceQuery,
};
use uuid::Uuid;

use crate::error::WebError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    post,
    path = "/api/payments/participation/requests/{id}/checkout",
    params(
        ("id" = Uuid, Path, description = "Participation request ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Checkout session opened or reused", body = CheckoutSessionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Request belongs to another user"),
        (status = 404, description = "Participation request not found"),
        (status = 409, description = "Request is not APPROVED")
    ),
    tag = "payments"
)]
pub async fn start_checkout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckoutSessionResponse>, WebError> {
    let session = services::create_checkout(&state, id, user.user_id).await?;

    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/api/payments/sessions/complete",
    params(ReferenceQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Payment settled, or already settled", body = CompletionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Payment session belongs to another user"),
        (status = 404, description = "Payment session not found"),
        (status = 409, description = "Event is full or request no longer approved")
    ),
    tag = "payments"
)]
pub async fn complete_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ReferenceQuery>,
) -> Result<Json<CompletionResponse>, WebError> {
    let completion = services::complete(&state, &query.reference, user.user_id).await?;

    Ok(Json(completion))
}

#[utoipa::path(
    post,
    path = "/api/payments/sessions/cancel",
    params(ReferenceQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Payment session cancelled", body = CancellationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Payment session belongs to another user"),
        (status = 404, description = "Payment session not found"),
        (status = 409, description = "Payment already succeeded")
    ),
    tag = "payments"
)]
pub async fn cancel_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ReferenceQuery>,
) -> Result<Json<CancellationResponse>, WebError> {
    let cancellation = services::cancel(&state, &query.reference, user.user_id).await?;

    Ok(Json(cancellation))
}

#[utoipa::path(
    get,
    path = "/api/payments/participation/requests/{id}/payment",
    params(
        ("id" = Uuid, Path, description = "Participation request ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Request and payment status", body = PaymentStatusResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Request belongs to another user"),
        (status = 404, description = "Participation request not found")
    ),
    tag = "payments"
)]
pub async fn get_payment_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentStatusResponse>, WebError> {
    let status = services::status(&state, id, user.user_id).await?;

    Ok(Json(status))
}
