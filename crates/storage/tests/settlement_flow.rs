mod common;

use common::{CHECKOUT_BASE_URL, TestDb};
use storage::{
    dto::payment::PaymentState,
    error::StorageError,
    models::{ParticipationStatus, PaymentStatus},
    services::{participation, settlement},
};
use std::time::Duration;

use uuid::Uuid;

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_checkout_requires_approved_request() {
    let t = TestDb::start().await.unwrap();
    let user = t.user("ada@example.com").await.unwrap();
    let event = t.event(5, 15000).await.unwrap();
    let request = participation::apply(t.pool(), user, event.id).await.unwrap();

    let err = settlement::create_checkout(t.pool(), request.id, user, CHECKOUT_BASE_URL)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)));
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_checkout_reuses_reference_and_resets_to_pending() {
    let t = TestDb::start().await.unwrap();
    let user = t.user("ada@example.com").await.unwrap();
    let event = t.event(5, 14900).await.unwrap();
    let request_id = t.approved_request(user, event.id).await.unwrap();

    let first = settlement::create_checkout(t.pool(), request_id, user, CHECKOUT_BASE_URL)
        .await
        .unwrap();
    assert!(first.session.reference.starts_with("ps_"));
    assert_eq!(
        first.session.url,
        format!("{CHECKOUT_BASE_URL}/pay?ref={}", first.session.reference)
    );
    assert_eq!(first.session.amount, event.price);
    assert_eq!(first.recipient, "ada@example.com");

    settlement::cancel(t.pool(), &first.session.reference, user)
        .await
        .unwrap();

    let second = settlement::create_checkout(t.pool(), request_id, user, CHECKOUT_BASE_URL)
        .await
        .unwrap();
    assert_eq!(second.session.reference, first.session.reference);

    let status = settlement::status(t.pool(), request_id, user).await.unwrap();
    assert_eq!(status.payment_status, PaymentState::Pending);
    assert_eq!(status.request_status, ParticipationStatus::Approved);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_status_before_checkout_reports_none() {
    let t = TestDb::start().await.unwrap();
    let user = t.user("ada@example.com").await.unwrap();
    let event = t.event(5, 15000).await.unwrap();
    let request_id = t.approved_request(user, event.id).await.unwrap();

    let status = settlement::status(t.pool(), request_id, user).await.unwrap();
    assert_eq!(status.payment_status, PaymentState::None);
    assert!(status.reference.is_none());
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_last_seat_goes_to_first_completion() {
    let t = TestDb::start().await.unwrap();
    let event = t.event(1, 15000).await.unwrap();
    let alice = t.user("alice@example.com").await.unwrap();
    let bob = t.user("bob@example.com").await.unwrap();
    let alice_request = t.approved_request(alice, event.id).await.unwrap();
    let bob_request = t.approved_request(bob, event.id).await.unwrap();

    let alice_checkout =
        settlement::create_checkout(t.pool(), alice_request, alice, CHECKOUT_BASE_URL)
            .await
            .unwrap();
    let bob_checkout = settlement::create_checkout(t.pool(), bob_request, bob, CHECKOUT_BASE_URL)
        .await
        .unwrap();

    let done = settlement::complete(t.pool(), &alice_checkout.session.reference, alice)
        .await
        .unwrap();
    assert!(!done.response.already_settled);
    assert_eq!(done.response.request_status, ParticipationStatus::Paid);
    let confirmation = done.confirmation.expect("seat granted");
    assert_eq!(confirmation.recipient, "alice@example.com");
    assert_eq!(confirmation.city, "Paris");

    match settlement::complete(t.pool(), &bob_checkout.session.reference, bob).await {
        Err(StorageError::Conflict(msg)) => assert_eq!(msg, "Event is full"),
        other => panic!("expected event full, got {other:?}"),
    }

    // The FAILED mark survives the refusal; the request stays APPROVED.
    let bob_status = settlement::status(t.pool(), bob_request, bob).await.unwrap();
    assert_eq!(bob_status.payment_status, PaymentState::Failed);
    assert_eq!(bob_status.request_status, ParticipationStatus::Approved);
    assert_eq!(t.count_with_status(event.id, "PAID").await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_completing_twice_is_idempotent() {
    let t = TestDb::start().await.unwrap();
    let user = t.user("ada@example.com").await.unwrap();
    let event = t.event(1, 15000).await.unwrap();
    let request_id = t.approved_request(user, event.id).await.unwrap();
    let checkout = settlement::create_checkout(t.pool(), request_id, user, CHECKOUT_BASE_URL)
        .await
        .unwrap();

    let first = settlement::complete(t.pool(), &checkout.session.reference, user)
        .await
        .unwrap();
    let second = settlement::complete(t.pool(), &checkout.session.reference, user)
        .await
        .unwrap();

    assert!(first.confirmation.is_some());
    assert!(second.response.already_settled);
    assert!(second.confirmation.is_none());
    assert_eq!(second.response.payment_status, PaymentStatus::Succeeded);
    assert_eq!(second.response.request_status, ParticipationStatus::Paid);
    assert_eq!(t.count_with_status(event.id, "PAID").await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_other_users_are_forbidden() {
    let t = TestDb::start().await.unwrap();
    let owner = t.user("ada@example.com").await.unwrap();
    let intruder = t.user("eve@example.com").await.unwrap();
    let event = t.event(5, 15000).await.unwrap();
    let request_id = t.approved_request(owner, event.id).await.unwrap();
    let checkout = settlement::create_checkout(t.pool(), request_id, owner, CHECKOUT_BASE_URL)
        .await
        .unwrap();
    let reference = checkout.session.reference.as_str();

    let checkout_err =
        settlement::create_checkout(t.pool(), request_id, intruder, CHECKOUT_BASE_URL)
            .await
            .unwrap_err();
    let complete_err = settlement::complete(t.pool(), reference, intruder)
        .await
        .unwrap_err();
    let cancel_err = settlement::cancel(t.pool(), reference, intruder)
        .await
        .unwrap_err();
    let status_err = settlement::status(t.pool(), request_id, intruder)
        .await
        .unwrap_err();

    for err in [checkout_err, complete_err, cancel_err, status_err] {
        assert!(matches!(err, StorageError::Forbidden(_)), "got {err:?}");
    }
    let status = settlement::status(t.pool(), request_id, owner).await.unwrap();
    assert_eq!(status.payment_status, PaymentState::Pending);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_unknown_reference_is_not_found() {
    let t = TestDb::start().await.unwrap();
    let user = t.user("ada@example.com").await.unwrap();

    let err = settlement::complete(t.pool(), "ps_missing", user)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound("Payment session")));

    let err = settlement::status(t.pool(), Uuid::new_v4(), user)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound("Participation request")));
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_cancelled_session_can_still_be_completed() {
    let t = TestDb::start().await.unwrap();
    let user = t.user("ada@example.com").await.unwrap();
    let event = t.event(2, 15000).await.unwrap();
    let request_id = t.approved_request(user, event.id).await.unwrap();
    let checkout = settlement::create_checkout(t.pool(), request_id, user, CHECKOUT_BASE_URL)
        .await
        .unwrap();

    let cancelled = settlement::cancel(t.pool(), &checkout.session.reference, user)
        .await
        .unwrap();
    assert_eq!(cancelled.payment_status, PaymentStatus::Failed);

    let done = settlement::complete(t.pool(), &checkout.session.reference, user)
        .await
        .unwrap();
    assert_eq!(done.response.payment_status, PaymentStatus::Succeeded);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_cancel_after_success_conflicts() {
    let t = TestDb::start().await.unwrap();
    let user = t.user("ada@example.com").await.unwrap();
    let event = t.event(2, 15000).await.unwrap();
    let request_id = t.approved_request(user, event.id).await.unwrap();
    let checkout = settlement::create_checkout(t.pool(), request_id, user, CHECKOUT_BASE_URL)
        .await
        .unwrap();
    settlement::complete(t.pool(), &checkout.session.reference, user)
        .await
        .unwrap();

    let err = settlement::cancel(t.pool(), &checkout.session.reference, user)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)));

    // A paid request cannot open another checkout either.
    let err = settlement::create_checkout(t.pool(), request_id, user, CHECKOUT_BASE_URL)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)));
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_checkout_retry_racing_completion_keeps_payment_settled() {
    let t = TestDb::start().await.unwrap();
    let user = t.user("ada@example.com").await.unwrap();
    let event = t.event(2, 15000).await.unwrap();
    let request_id = t.approved_request(user, event.id).await.unwrap();
    let checkout = settlement::create_checkout(t.pool(), request_id, user, CHECKOUT_BASE_URL)
        .await
        .unwrap();
    let reference = checkout.session.reference;

    // Hold the payment row the way an in-flight completion does.
    let mut settling = t.pool().begin().await.unwrap();
    sqlx::query("SELECT id FROM payments WHERE reference = $1 FOR UPDATE")
        .bind(&reference)
        .execute(&mut *settling)
        .await
        .unwrap();

    let retry = {
        let pool = t.pool().clone();
        tokio::spawn(async move {
            settlement::create_checkout(&pool, request_id, user, CHECKOUT_BASE_URL).await
        })
    };
    tokio::time::sleep(Duration::from_millis(300)).await;

    sqlx::query("UPDATE payments SET status = 'SUCCEEDED' WHERE reference = $1")
        .bind(&reference)
        .execute(&mut *settling)
        .await
        .unwrap();
    sqlx::query("UPDATE participation_requests SET status = 'PAID' WHERE id = $1")
        .bind(request_id)
        .execute(&mut *settling)
        .await
        .unwrap();
    settling.commit().await.unwrap();

    let err = retry.await.unwrap().unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)), "got {err:?}");

    let status = settlement::status(t.pool(), request_id, user).await.unwrap();
    assert_eq!(status.payment_status, PaymentState::Succeeded);
    assert_eq!(status.request_status, ParticipationStatus::Paid);

    let err = settlement::cancel(t.pool(), &reference, user)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)));
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_rejected_request_cannot_complete_pending_payment() {
    let t = TestDb::start().await.unwrap();
    let user = t.user("ada@example.com").await.unwrap();
    let event = t.event(2, 15000).await.unwrap();
    let request_id = t.approved_request(user, event.id).await.unwrap();
    let checkout = settlement::create_checkout(t.pool(), request_id, user, CHECKOUT_BASE_URL)
        .await
        .unwrap();

    participation::review(
        t.pool(),
        request_id,
        storage::dto::participation::ReviewDecision::Rejected,
    )
    .await
    .unwrap();

    let err = settlement::complete(t.pool(), &checkout.session.reference, user)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)));
    assert_eq!(t.count_with_status(event.id, "PAID").await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_concurrent_completions_never_exceed_capacity() {
    const MAX: i32 = 3;
    const APPLICANTS: usize = 10;

    let t = TestDb::start().await.unwrap();
    let event = t.event(MAX, 15000).await.unwrap();

    let mut sessions = Vec::with_capacity(APPLICANTS);
    for i in 0..APPLICANTS {
        let user = t.user(&format!("guest{i}@example.com")).await.unwrap();
        let request_id = t.approved_request(user, event.id).await.unwrap();
        let checkout = settlement::create_checkout(t.pool(), request_id, user, CHECKOUT_BASE_URL)
            .await
            .unwrap();
        sessions.push((user, checkout.session.reference));
    }

    let attempts = sessions.into_iter().map(|(user, reference)| {
        let pool = t.pool().clone();
        tokio::spawn(async move { settlement::complete(&pool, &reference, user).await })
    });
    let results: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let admitted = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(StorageError::Conflict(_))))
        .count();

    assert_eq!(admitted, MAX as usize);
    assert_eq!(refused, APPLICANTS - MAX as usize);
    assert_eq!(
        t.count_with_status(event.id, "PAID").await.unwrap(),
        i64::from(MAX)
    );
}
