use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::PaginationParams;

/// Share of the audience an event wants from one sector.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct TargetSectorInput {
    pub sector_id: Uuid,

    #[validate(range(min = 0, max = 100, message = "Percentage must be between 0 and 100"))]
    pub percentage: i32,
}

/// Request payload for creating a new event
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateEventRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Title must be between 1 and 255 characters"
    ))]
    pub title: String,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[validate(length(
        min = 1,
        max = 120,
        message = "City must be between 1 and 120 characters"
    ))]
    pub city: String,

    pub event_date_time: DateTime<Utc>,

    #[validate(range(min = 1, message = "Max participants must be at least 1"))]
    pub max_participants: i32,

    #[schema(value_type = String, example = "149.00")]
    pub price: Decimal,

    #[validate(range(min = 0, max = 100))]
    pub target_director_percentage: Option<i32>,

    #[serde(default)]
    #[validate(nested)]
    pub target_sectors: Vec<TargetSectorInput>,
}

impl CreateEventRequest {
    /// Rules spanning several fields: non-negative price, and target sectors
    /// that are distinct and add up to exactly 100.
    pub fn validate_targets(&self) -> Result<(), &'static str> {
        if self.price.is_sign_negative() {
            return Err("Price must not be negative");
        }

        if self.target_sectors.is_empty() {
            return Ok(());
        }

        let sum: i32 = self.target_sectors.iter().map(|t| t.percentage).sum();
        if sum != 100 {
            return Err("Sum of target sector percentages must equal 100");
        }

        let distinct: HashSet<Uuid> = self.target_sectors.iter().map(|t| t.sector_id).collect();
        if distinct.len() != self.target_sectors.len() {
            return Err("Duplicate sector_id in target sectors");
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub city: String,
    pub event_date_time: DateTime<Utc>,
    pub max_participants: i32,
    #[schema(value_type = String, example = "149.00")]
    pub price: Decimal,
    pub target_director_percentage: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::models::Event> for EventResponse {
    fn from(event: crate::models::Event) -> Self {
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            city: event.city,
            event_date_time: event.event_date_time,
            max_participants: event.max_participants,
            price: event.price,
            target_director_percentage: event.target_director_percentage,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TargetSectorResponse {
    pub sector_id: Uuid,
    pub sector_name: String,
    pub percentage: i32,
}

/// Admin view of an event including its audience composition targets
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventDetailResponse {
    #[serde(flatten)]
    pub event: EventResponse,
    pub target_sectors: Vec<TargetSectorResponse>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PublicEventFilter {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Case-insensitive exact city match
    pub city: Option<String>,
    /// Lower bound on the event date, defaults to now
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

fn default_page() -> u32 {
    PaginationParams::default().page
}

fn default_page_size() -> u32 {
    PaginationParams::default().page_size
}

impl PublicEventFilter {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.page_size)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.pagination().validate()?;

        if let (Some(from), Some(to)) = (self.from, self.to)
            && to < from
        {
            return Err("'to' must be on or after 'from'".to_string());
        }

        Ok(())
    }
}
