use sqlx::PgPool;
use storage::{
    dto::{
        common::PaginatedResponse,
        participation::{AdminRequestFilter, ParticipationRequestDetail, ReviewDecision},
    },
    error::Result,
    services::participation,
};
use uuid::Uuid;

/// Apply to an event as the calling user
pub async fn apply(pool: &PgPool, user_id: Uuid, event_id: Uuid) -> Result<ParticipationRequestDetail> {
    participation::apply(pool, user_id, event_id).await
}

/// List the calling user's requests
pub async fn list_mine(pool: &PgPool, user_id: Uuid) -> Result<Vec<ParticipationRequestDetail>> {
    participation::list_mine(pool, user_id).await
}

/// Paginated admin listing
pub async fn list_admin(
    pool: &PgPool,
    filter: &AdminRequestFilter,
) -> Result<PaginatedResponse<ParticipationRequestDetail>> {
    let (requests, total_items) = participation::list_admin(pool, filter).await?;
    Ok(PaginatedResponse::new(requests, filter.pagination(), total_items))
}

/// Approve or reject a request
pub async fn review(
    pool: &PgPool,
    request_id: Uuid,
    decision: ReviewDecision,
) -> Result<ParticipationRequestDetail> {
    participation::review(pool, request_id, decision).await
}
