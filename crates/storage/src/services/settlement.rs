//! Capacity-checked settlement of approved participation requests.
//!
//! Checkout hands out a reference; completing that reference turns an
//! APPROVED request into a PAID one if the event still has a free seat.
//! Seats are never stored as a counter: each completion counts the PAID and
//! CONFIRMED siblings of its request while holding the event row lock, so
//! concurrent completions for one event are admitted one at a time.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::payment::{
    CancellationResponse, CheckoutSessionResponse, CompletionResponse, PaymentState,
    PaymentStatusResponse,
};
use crate::error::{Result, StorageError};
use crate::models::{ParticipationStatus, PaymentStatus};
use crate::repository::event::EventRepository;
use crate::repository::participation::ParticipationRepository;
use crate::repository::payment::PaymentRepository;

/// What a completion attempt is allowed to do once the event lock is held
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The payment already succeeded; nothing to write.
    AlreadySettled,
    Admit,
    EventFull,
}

pub fn ensure_owner(owner: Uuid, caller: Uuid, resource: &str) -> Result<()> {
    if owner == caller {
        Ok(())
    } else {
        Err(StorageError::Forbidden(format!("Not your {resource}.")))
    }
}

pub fn ensure_checkout_allowed(status: ParticipationStatus) -> Result<()> {
    if status.is_payable() {
        Ok(())
    } else {
        Err(StorageError::Conflict(format!(
            "Request must be APPROVED to pay (current: {status})."
        )))
    }
}

pub fn ensure_cancellable(status: PaymentStatus) -> Result<()> {
    if status.is_settled() {
        Err(StorageError::Conflict("Payment already succeeded.".to_string()))
    } else {
        Ok(())
    }
}

/// Decide the fate of a completion from a consistent snapshot.
///
/// `seats_taken` counts the other requests of the event that hold a seat.
pub fn decide_admission(
    payment_status: PaymentStatus,
    request_status: ParticipationStatus,
    seats_taken: i64,
    max_participants: i32,
) -> Result<Admission> {
    if payment_status.is_settled() {
        return Ok(Admission::AlreadySettled);
    }

    if !request_status.is_payable() {
        return Err(StorageError::Conflict(format!(
            "Request must be APPROVED to complete payment (current: {request_status})."
        )));
    }

    if seats_taken >= i64::from(max_participants) {
        Ok(Admission::EventFull)
    } else {
        Ok(Admission::Admit)
    }
}

pub fn checkout_url(base_url: &str, reference: &str) -> String {
    format!(
        "{}/pay?ref={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(reference)
    )
}

fn new_reference() -> String {
    format!("ps_{}", Uuid::new_v4().simple())
}

/// A checkout ready to be handed to the applicant
#[derive(Debug, Clone)]
pub struct CheckoutIssued {
    pub session: CheckoutSessionResponse,
    pub recipient: String,
}

/// Details for the confirmation message sent once a seat is granted
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub recipient: String,
    pub event_title: String,
    pub event_date_time: DateTime<Utc>,
    pub city: String,
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub response: CompletionResponse,
    /// Present only when this call granted the seat.
    pub confirmation: Option<Confirmation>,
}

/// Open a checkout for an approved request, reusing its reference on retries.
///
/// The amount is the event price at the time of this call.
pub async fn create_checkout(
    pool: &PgPool,
    request_id: Uuid,
    caller: Uuid,
    checkout_base_url: &str,
) -> Result<CheckoutIssued> {
    let detail = ParticipationRepository::new(pool)
        .find_detail(request_id)
        .await?;

    ensure_owner(detail.user_id, caller, "request")?;
    ensure_checkout_allowed(detail.status)?;

    let candidate = detail
        .payment
        .as_ref()
        .map(|payment| payment.reference.clone())
        .unwrap_or_else(new_reference);

    let payment = PaymentRepository::new(pool)
        .upsert_pending(request_id, detail.event.price, &candidate)
        .await?;

    tracing::info!(
        %request_id,
        reference = %payment.reference,
        amount = %payment.amount,
        "Checkout session opened"
    );

    let recipient = detail
        .user
        .map(|user| user.email)
        .ok_or(StorageError::NotFound("User"))?;

    Ok(CheckoutIssued {
        session: CheckoutSessionResponse {
            url: checkout_url(checkout_base_url, &payment.reference),
            reference: payment.reference,
            amount: payment.amount,
        },
        recipient,
    })
}

/// Settle a payment reference, granting a seat if one is left.
///
/// Runs in one transaction. Completing an already succeeded payment is a
/// no-op success. When the event is full the payment is marked FAILED and
/// that mark is committed before the Conflict is returned.
pub async fn complete(pool: &PgPool, reference: &str, caller: Uuid) -> Result<Completion> {
    let mut tx = pool.begin().await?;

    let context = PaymentRepository::find_context_in(&mut tx, reference, false).await?;
    ensure_owner(context.user_id, caller, "payment session")?;

    if context.payment_status.is_settled() {
        tx.commit().await?;
        return Ok(already_settled(context.reference, context.request_status));
    }

    EventRepository::lock_for_settlement(&mut tx, context.event_id).await?;

    // Re-read under lock: a completion that committed while we waited is visible now.
    let context = PaymentRepository::find_context_in(&mut tx, reference, true).await?;
    let seats_taken =
        ParticipationRepository::count_seats_taken(&mut tx, context.event_id, context.request_id)
            .await?;

    match decide_admission(
        context.payment_status,
        context.request_status,
        seats_taken,
        context.max_participants,
    )? {
        Admission::AlreadySettled => {
            tx.commit().await?;
            Ok(already_settled(context.reference, context.request_status))
        }
        Admission::EventFull => {
            PaymentRepository::set_status_in(&mut tx, context.payment_id, PaymentStatus::Failed)
                .await?;
            tx.commit().await?;

            tracing::warn!(
                reference = %context.reference,
                event_id = %context.event_id,
                seats_taken,
                max_participants = context.max_participants,
                "Settlement refused, event is full"
            );
            Err(StorageError::Conflict("Event is full".to_string()))
        }
        Admission::Admit => {
            PaymentRepository::set_status_in(&mut tx, context.payment_id, PaymentStatus::Succeeded)
                .await?;
            ParticipationRepository::set_status_in(
                &mut tx,
                context.request_id,
                ParticipationStatus::Paid,
            )
            .await?;
            tx.commit().await?;

            tracing::info!(
                reference = %context.reference,
                request_id = %context.request_id,
                event_id = %context.event_id,
                "Payment settled, seat granted"
            );

            Ok(Completion {
                response: CompletionResponse {
                    ok: true,
                    reference: context.reference,
                    payment_status: PaymentStatus::Succeeded,
                    request_status: ParticipationStatus::Paid,
                    already_settled: false,
                },
                confirmation: Some(Confirmation {
                    recipient: context.user_email,
                    event_title: context.event_title,
                    event_date_time: context.event_date_time,
                    city: context.event_city,
                }),
            })
        }
    }
}

fn already_settled(reference: String, request_status: ParticipationStatus) -> Completion {
    Completion {
        response: CompletionResponse {
            ok: true,
            reference,
            payment_status: PaymentStatus::Succeeded,
            request_status,
            already_settled: true,
        },
        confirmation: None,
    }
}

/// Abandon a checkout. The request stays APPROVED and may check out again.
pub async fn cancel(pool: &PgPool, reference: &str, caller: Uuid) -> Result<CancellationResponse> {
    let repo = PaymentRepository::new(pool);
    let context = repo.find_context(reference).await?;

    ensure_owner(context.user_id, caller, "payment session")?;
    ensure_cancellable(context.payment_status)?;

    if !repo.fail_unless_succeeded(context.payment_id).await? {
        return Err(StorageError::Conflict("Payment already succeeded.".to_string()));
    }

    tracing::info!(reference = %context.reference, "Checkout session cancelled");

    Ok(CancellationResponse {
        ok: true,
        reference: context.reference,
        payment_status: PaymentStatus::Failed,
    })
}

pub async fn status(pool: &PgPool, request_id: Uuid, caller: Uuid) -> Result<PaymentStatusResponse> {
    let request = ParticipationRepository::new(pool)
        .find_by_id(request_id)
        .await?;
    ensure_owner(request.user_id, caller, "request")?;

    let payment = PaymentRepository::new(pool)
        .find_by_request_id(request_id)
        .await?;

    Ok(PaymentStatusResponse {
        request_status: request.status,
        payment_status: PaymentState::from(payment.as_ref().map(|p| p.status)),
        reference: payment.map(|p| p.reference),
    })
}
