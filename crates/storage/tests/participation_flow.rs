mod common;

use common::TestDb;
use storage::{
    dto::participation::{AdminRequestFilter, ReviewDecision},
    error::StorageError,
    models::ParticipationStatus,
    services::participation,
};
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_apply_creates_pending_request() {
    let t = TestDb::start().await.unwrap();
    let user = t.user("ada@example.com").await.unwrap();
    let event = t.event(10, 15000).await.unwrap();

    let request = participation::apply(t.pool(), user, event.id).await.unwrap();

    assert_eq!(request.status, ParticipationStatus::Pending);
    assert_eq!(request.event.id, event.id);
    assert!(request.payment.is_none());
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_apply_to_unknown_event_is_not_found() {
    let t = TestDb::start().await.unwrap();
    let user = t.user("ada@example.com").await.unwrap();

    let err = participation::apply(t.pool(), user, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound("Event")));
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_second_application_conflicts_while_active() {
    let t = TestDb::start().await.unwrap();
    let user = t.user("ada@example.com").await.unwrap();
    let event = t.event(10, 15000).await.unwrap();

    let first = participation::apply(t.pool(), user, event.id).await.unwrap();
    match participation::apply(t.pool(), user, event.id).await {
        Err(StorageError::Conflict(msg)) => assert!(msg.contains("PENDING")),
        other => panic!("expected conflict, got {other:?}"),
    }

    participation::review(t.pool(), first.id, ReviewDecision::Approved)
        .await
        .unwrap();
    match participation::apply(t.pool(), user, event.id).await {
        Err(StorageError::Conflict(msg)) => assert!(msg.contains("APPROVED")),
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_reapplication_after_rejection_keeps_history() {
    let t = TestDb::start().await.unwrap();
    let user = t.user("ada@example.com").await.unwrap();
    let event = t.event(10, 15000).await.unwrap();

    let first = participation::apply(t.pool(), user, event.id).await.unwrap();
    participation::review(t.pool(), first.id, ReviewDecision::Rejected)
        .await
        .unwrap();

    let second = participation::apply(t.pool(), user, event.id).await.unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(second.status, ParticipationStatus::Pending);

    let mine = participation::list_mine(t.pool(), user).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].id, second.id, "newest first");
    assert_eq!(mine[1].status, ParticipationStatus::Rejected);
    assert!(mine.iter().all(|r| r.user.is_none()));
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_concurrent_applications_yield_one_active_request() {
    let t = TestDb::start().await.unwrap();
    let user = t.user("ada@example.com").await.unwrap();
    let event = t.event(10, 15000).await.unwrap();

    let attempts = (0..5).map(|_| {
        let pool = t.pool().clone();
        let event_id = event.id;
        tokio::spawn(async move { participation::apply(&pool, user, event_id).await })
    });
    let results = futures::future::join_all(attempts).await;

    let created = results
        .into_iter()
        .map(|r| r.unwrap())
        .filter(|r| r.is_ok())
        .count();
    assert_eq!(created, 1);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_review_overwrites_any_status() {
    let t = TestDb::start().await.unwrap();
    let user = t.user("ada@example.com").await.unwrap();
    let event = t.event(10, 15000).await.unwrap();
    let request = participation::apply(t.pool(), user, event.id).await.unwrap();

    let approved = participation::review(t.pool(), request.id, ReviewDecision::Approved)
        .await
        .unwrap();
    assert_eq!(approved.status, ParticipationStatus::Approved);
    assert_eq!(
        approved.user.as_ref().map(|u| u.email.as_str()),
        Some("ada@example.com")
    );

    // No PENDING guard: an approved request can be re-reviewed.
    let rejected = participation::review(t.pool(), request.id, ReviewDecision::Rejected)
        .await
        .unwrap();
    assert_eq!(rejected.status, ParticipationStatus::Rejected);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_reviving_old_request_beside_active_one_conflicts() {
    let t = TestDb::start().await.unwrap();
    let user = t.user("ada@example.com").await.unwrap();
    let event = t.event(10, 15000).await.unwrap();

    let first = participation::apply(t.pool(), user, event.id).await.unwrap();
    participation::review(t.pool(), first.id, ReviewDecision::Rejected)
        .await
        .unwrap();
    let second = participation::apply(t.pool(), user, event.id).await.unwrap();

    match participation::review(t.pool(), first.id, ReviewDecision::Approved).await {
        Err(StorageError::Conflict(msg)) => assert!(msg.contains("APPROVED"), "message was {msg}"),
        other => panic!("expected conflict, got {other:?}"),
    }

    let mine = participation::list_mine(t.pool(), user).await.unwrap();
    let status_of = |id| mine.iter().find(|r| r.id == id).map(|r| r.status);
    assert_eq!(status_of(first.id), Some(ParticipationStatus::Rejected));
    assert_eq!(status_of(second.id), Some(ParticipationStatus::Pending));
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_review_unknown_request_is_not_found() {
    let t = TestDb::start().await.unwrap();

    let err = participation::review(t.pool(), Uuid::new_v4(), ReviewDecision::Approved)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound("Participation request")));
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_admin_listing_filters_and_paginates() {
    let t = TestDb::start().await.unwrap();
    let event = t.event(10, 15000).await.unwrap();

    for i in 0..3 {
        let user = t.user(&format!("pending{i}@example.com")).await.unwrap();
        participation::apply(t.pool(), user, event.id).await.unwrap();
    }
    let approved_user = t.user("grace@corp.example").await.unwrap();
    t.approved_request(approved_user, event.id).await.unwrap();

    let filter = AdminRequestFilter {
        page: 1,
        page_size: 2,
        status: Some(ParticipationStatus::Pending),
        q: None,
    };
    let (page, total) = participation::list_admin(t.pool(), &filter).await.unwrap();
    assert_eq!(total, 3);
    assert_eq!(page.len(), 2);
    assert!(page.iter().all(|r| r.status == ParticipationStatus::Pending));

    let filter = AdminRequestFilter {
        page: 1,
        page_size: 10,
        status: None,
        q: Some("CORP.example".to_string()),
    };
    let (page, total) = participation::list_admin(t.pool(), &filter).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(page[0].user_id, approved_user);
    assert!(page[0].user.is_some());
}
