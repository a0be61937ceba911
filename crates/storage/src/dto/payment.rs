use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::{ParticipationStatus, PaymentStatus};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: Uuid,
    #[schema(value_type = String, example = "149.00")]
    pub amount: Decimal,
    pub reference: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reference query parameter used by the session endpoints
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReferenceQuery {
    /// Payment reference returned by checkout
    #[serde(rename = "ref")]
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutSessionResponse {
    pub reference: String,
    /// Payment page embedding the reference
    pub url: String,
    #[schema(value_type = String, example = "149.00")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompletionResponse {
    pub ok: bool,
    pub reference: String,
    pub payment_status: PaymentStatus,
    pub request_status: ParticipationStatus,
    /// True when the payment had already succeeded before this call
    pub already_settled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CancellationResponse {
    pub ok: bool,
    pub reference: String,
    pub payment_status: PaymentStatus,
}

/// Payment state as seen from a participation request; `NONE` until the
/// first checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
    None,
    Pending,
    Succeeded,
    Failed,
}

impl From<Option<PaymentStatus>> for PaymentState {
    fn from(status: Option<PaymentStatus>) -> Self {
        match status {
            None => Self::None,
            Some(PaymentStatus::Pending) => Self::Pending,
            Some(PaymentStatus::Succeeded) => Self::Succeeded,
            Some(PaymentStatus::Failed) => Self::Failed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentStatusResponse {
    pub request_status: ParticipationStatus,
    pub payment_status: PaymentState,
    pub reference: Option<String>,
}
