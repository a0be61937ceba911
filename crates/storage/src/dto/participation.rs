use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::common::PaginationParams;
use super::event::EventResponse;
use super::payment::PaymentResponse;
use crate::models::ParticipationStatus;

/// Outcome an admin may record on a participation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl From<ReviewDecision> for ParticipationStatus {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approved => ParticipationStatus::Approved,
            ReviewDecision::Rejected => ParticipationStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewRequest {
    pub status: ReviewDecision,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub company_name: Option<String>,
    pub job_title: Option<String>,
}

/// A participation request joined with its event, its payment and,
/// on admin views, the applicant.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParticipationRequestDetail {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub status: ParticipationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub event: EventResponse,
    pub payment: Option<PaymentResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

impl ParticipationRequestDetail {
    pub fn without_user(mut self) -> Self {
        self.user = None;
        self
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AdminRequestFilter {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    pub status: Option<ParticipationStatus>,
    /// Searches applicant email, event title and event city
    pub q: Option<String>,
}

fn default_page() -> u32 {
    PaginationParams::default().page
}

fn default_page_size() -> u32 {
    PaginationParams::default().page_size
}

impl AdminRequestFilter {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.page_size)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.pagination().validate()?;

        if let Some(ref q) = self.q
            && q.len() > 255
        {
            return Err("q must be at most 255 characters".to_string());
        }

        Ok(())
    }

    /// Search term with surrounding whitespace removed, `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}
