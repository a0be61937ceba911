use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub city: String,
    pub event_date_time: DateTime<Utc>,
    /// Capacity ceiling; seats are counted from request rows, never stored.
    pub max_participants: i32,
    /// Amount captured into a payment at checkout time.
    pub price: Decimal,
    pub target_director_percentage: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EventTargetSector {
    pub event_id: Uuid,
    pub sector_id: Uuid,
    pub percentage: i32,
}
