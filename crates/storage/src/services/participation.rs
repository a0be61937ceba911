//! Participation lifecycle: applications and their admin review.

use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::participation::{AdminRequestFilter, ParticipationRequestDetail, ReviewDecision};
use crate::error::{Result, StorageError};
use crate::models::{ParticipationRequest, ParticipationStatus};
use crate::repository::event::EventRepository;
use crate::repository::participation::ParticipationRepository;

/// A user may apply again only when their latest request was rejected.
pub fn ensure_can_apply(latest: Option<&ParticipationRequest>) -> Result<()> {
    match latest {
        Some(existing) if existing.status.is_active() => Err(StorageError::Conflict(format!(
            "You already have a {} request for this event.",
            existing.status
        ))),
        _ => Ok(()),
    }
}

/// Create a PENDING request for `event_id` on behalf of `user_id`
pub async fn apply(pool: &PgPool, user_id: Uuid, event_id: Uuid) -> Result<ParticipationRequestDetail> {
    EventRepository::new(pool).find_by_id(event_id).await?;

    let repo = ParticipationRepository::new(pool);
    let latest = repo.find_latest(user_id, event_id).await?;
    ensure_can_apply(latest.as_ref())?;

    let request = repo.create(user_id, event_id).await?;
    tracing::info!(
        request_id = %request.id,
        %user_id,
        %event_id,
        "Participation request created"
    );

    Ok(repo.find_detail(request.id).await?.without_user())
}

/// Requests of a user with their event and payment, newest first
pub async fn list_mine(pool: &PgPool, user_id: Uuid) -> Result<Vec<ParticipationRequestDetail>> {
    ParticipationRepository::new(pool).list_for_user(user_id).await
}

/// Filtered, paginated listing for admins
pub async fn list_admin(
    pool: &PgPool,
    filter: &AdminRequestFilter,
) -> Result<(Vec<ParticipationRequestDetail>, i64)> {
    ParticipationRepository::new(pool).list_admin(filter).await
}

/// Record an admin decision.
///
/// Any current status is overwritten, including PAID; no seat is consumed
/// or released here.
pub async fn review(
    pool: &PgPool,
    request_id: Uuid,
    decision: ReviewDecision,
) -> Result<ParticipationRequestDetail> {
    let repo = ParticipationRepository::new(pool);
    let current = repo.find_by_id(request_id).await?;
    let next = ParticipationStatus::from(decision);

    if current.status != ParticipationStatus::Pending {
        tracing::warn!(
            %request_id,
            from = %current.status,
            to = %next,
            "Re-reviewing a request that is no longer pending"
        );
    }

    repo.update_status(request_id, next).await?;
    tracing::info!(%request_id, status = %next, "Participation request reviewed");

    repo.find_detail(request_id).await
}
