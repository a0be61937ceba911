use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of one user's candidacy for one event.
///
/// ```text
/// PENDING ──review──> APPROVED ──complete──> PAID ──> CONFIRMED
///    │
///    └──review──> REJECTED (terminal, unlocks a fresh application)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "participation_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipationStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
    Confirmed,
}

impl ParticipationStatus {
    /// Statuses that occupy one unit of the event's capacity.
    pub const SEAT_HOLDING: [Self; 2] = [Self::Paid, Self::Confirmed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Paid => "PAID",
            Self::Confirmed => "CONFIRMED",
        }
    }

    /// Anything but REJECTED blocks a new application for the same event.
    pub fn is_active(self) -> bool {
        self != Self::Rejected
    }

    /// Only approved requests may open a checkout or be settled.
    pub fn is_payable(self) -> bool {
        self == Self::Approved
    }
}

impl fmt::Display for ParticipationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ParticipationRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub status: ParticipationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
