use sqlx::PgPool;
use storage::{
    dto::{
        common::PaginatedResponse,
        event::{CreateEventRequest, EventDetailResponse, EventResponse, PublicEventFilter},
    },
    error::Result,
    services::catalog,
};
use uuid::Uuid;

/// Upcoming events, paginated
pub async fn list_public_events(
    pool: &PgPool,
    filter: &PublicEventFilter,
) -> Result<PaginatedResponse<EventResponse>> {
    let (events, total_items) = catalog::list_public_events(pool, filter).await?;

    Ok(PaginatedResponse::new(
        events.into_iter().map(EventResponse::from).collect(),
        filter.pagination(),
        total_items,
    ))
}

pub async fn get_event(pool: &PgPool, id: Uuid) -> Result<EventResponse> {
    catalog::get_event(pool, id).await.map(EventResponse::from)
}

pub async fn get_event_detail(pool: &PgPool, id: Uuid) -> Result<EventDetailResponse> {
    catalog::get_event_detail(pool, id).await
}

pub async fn create_event(pool: &PgPool, request: &CreateEventRequest) -> Result<EventDetailResponse> {
    catalog::create_event(pool, request).await
}
