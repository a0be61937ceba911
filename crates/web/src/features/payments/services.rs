use storage::{
    dto::payment::{
        CancellationResponse, CheckoutSessionResponse, CompletionResponse, PaymentStatusResponse,
    },
    error::Result,
    services::settlement,
};
use uuid::Uuid;

use crate::notifier::{dispatch_confirmation, dispatch_payment_link};
use crate::state::AppState;

/// Open or reuse a checkout and mail the payment link
pub async fn create_checkout(
    state: &AppState,
    request_id: Uuid,
    caller: Uuid,
) -> Result<CheckoutSessionResponse> {
    let issued = settlement::create_checkout(
        state.db.pool(),
        request_id,
        caller,
        &state.checkout_base_url,
    )
    .await?;

    dispatch_payment_link(
        state.notifier.clone(),
        issued.recipient,
        issued.session.url.clone(),
    );

    Ok(issued.session)
}

/// Settle a reference; a newly granted seat triggers the confirmation
pub async fn complete(state: &AppState, reference: &str, caller: Uuid) -> Result<CompletionResponse> {
    let completion = settlement::complete(state.db.pool(), reference, caller).await?;

    if let Some(confirmation) = completion.confirmation {
        dispatch_confirmation(state.notifier.clone(), confirmation);
    }

    Ok(completion.response)
}

pub async fn cancel(state: &AppState, reference: &str, caller: Uuid) -> Result<CancellationResponse> {
    settlement::cancel(state.db.pool(), reference, caller).await
}

pub async fn status(state: &AppState, request_id: Uuid, caller: Uuid) -> Result<PaymentStatusResponse> {
    settlement::status(state.db.pool(), request_id, caller).await
}
