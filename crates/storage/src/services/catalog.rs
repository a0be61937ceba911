use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::event::{CreateEventRequest, EventDetailResponse, EventResponse, PublicEventFilter};
use crate::dto::sector::CreateSectorRequest;
use crate::error::Result;
use crate::models::{Event, Sector};
use crate::repository::event::EventRepository;
use crate::repository::sector::SectorRepository;

/// List all sectors
pub async fn list_sectors(pool: &PgPool) -> Result<Vec<Sector>> {
    SectorRepository::new(pool).list().await
}

/// Create a new sector
pub async fn create_sector(pool: &PgPool, request: &CreateSectorRequest) -> Result<Sector> {
    let sector = SectorRepository::new(pool).create(request).await?;
    tracing::info!(sector_id = %sector.id, name = %sector.name, "Sector created");
    Ok(sector)
}

/// Create an event with its target sectors
pub async fn create_event(pool: &PgPool, request: &CreateEventRequest) -> Result<EventDetailResponse> {
    let repo = EventRepository::new(pool);
    let event = repo.create(request).await?;
    tracing::info!(event_id = %event.id, title = %event.title, "Event created");

    let target_sectors = repo.find_target_sectors(event.id).await?;
    Ok(EventDetailResponse {
        event: EventResponse::from(event),
        target_sectors,
    })
}

/// Get an event with its target sectors
pub async fn get_event_detail(pool: &PgPool, id: Uuid) -> Result<EventDetailResponse> {
    let repo = EventRepository::new(pool);
    let event = repo.find_by_id(id).await?;
    let target_sectors = repo.find_target_sectors(id).await?;

    Ok(EventDetailResponse {
        event: EventResponse::from(event),
        target_sectors,
    })
}

/// Get a single event
pub async fn get_event(pool: &PgPool, id: Uuid) -> Result<Event> {
    EventRepository::new(pool).find_by_id(id).await
}

/// List upcoming events
pub async fn list_public_events(
    pool: &PgPool,
    filter: &PublicEventFilter,
) -> Result<(Vec<Event>, i64)> {
    EventRepository::new(pool).list_public(filter).await
}
