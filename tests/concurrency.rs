//! Competing writers on the same users and pairs.

mod helpers;

use diary_friends_service::common::error::AppError;
use diary_friends_service::common::state::AppState;
use diary_friends_service::models::relationships::RelationshipStatus;
use diary_friends_service::usecases::relationships;
use helpers::seeded;
use tokio::task::JoinSet;

async fn befriend(state: &AppState, requester_id: i64, target_id: i64) {
    let request = relationships::send_request(state, requester_id, target_id)
        .await
        .unwrap();
    relationships::respond(state, request.relationship_id, target_id, true)
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn last_free_slot_goes_to_exactly_one_accept() {
    let (backend, state) = seeded();
    for friend_id in 2..=5 {
        befriend(&state, 1, friend_id).await;
    }
    let mut request_ids = Vec::new();
    for requester_id in 6..=9 {
        let request = relationships::send_request(&state, requester_id, 1)
            .await
            .unwrap();
        request_ids.push(request.relationship_id);
    }

    let mut accepts = JoinSet::new();
    for request_id in request_ids {
        let state = state.clone();
        accepts.spawn(async move { relationships::respond(&state, request_id, 1, true).await });
    }
    let mut accepted = 0;
    while let Some(result) = accepts.join_next().await {
        match result.unwrap() {
            Ok(relationship) => {
                assert_eq!(relationship.status, RelationshipStatus::Accepted);
                accepted += 1;
            }
            Err(e) => assert!(matches!(e, AppError::RelationshipsFriendLimit), "{e:?}"),
        }
    }
    assert_eq!(accepted, 1);

    let count = relationships::fetch_friend_count(&state, 1).await.unwrap();
    assert_eq!(count.count, relationships::MAX_FRIENDS);
    let pending = backend
        .relationships
        .rows()
        .await
        .into_iter()
        .filter(|row| row.status == RelationshipStatus::Pending)
        .count();
    assert_eq!(pending, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn crossed_requests_leave_a_single_pending_row() {
    let (backend, state) = seeded();
    let mut sends = JoinSet::new();
    for (requester_id, target_id) in [(1, 2), (2, 1), (1, 2), (2, 1)] {
        let state = state.clone();
        sends.spawn(async move { relationships::send_request(&state, requester_id, target_id).await });
    }
    let mut created = 0;
    while let Some(result) = sends.join_next().await {
        match result.unwrap() {
            Ok(_) => created += 1,
            Err(e) => assert!(matches!(e, AppError::RelationshipsRequestExists), "{e:?}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(backend.relationships.rows().await.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn accept_and_cancel_race_has_one_winner() {
    let (backend, state) = seeded();
    let request = relationships::send_request(&state, 1, 2).await.unwrap();
    let request_id = request.relationship_id;

    let accept = tokio::spawn({
        let state = state.clone();
        async move { relationships::respond(&state, request_id, 2, true).await }
    });
    let cancel = tokio::spawn({
        let state = state.clone();
        async move { relationships::cancel(&state, request_id, 1).await }
    });
    let accept = accept.await.unwrap();
    let cancel = cancel.await.unwrap();

    assert!(accept.is_ok() != cancel.is_ok());
    let loser = accept.err().or(cancel.err()).unwrap();
    assert!(matches!(loser, AppError::RelationshipsNotPending), "{loser:?}");

    let rows = backend.relationships.rows().await;
    assert_eq!(rows.len(), 1);
    assert!(matches!(
        rows[0].status,
        RelationshipStatus::Accepted | RelationshipStatus::Cancelled
    ));
}
