//! Friend lists, removal, status views and notification blocks.

mod helpers;

use chrono::TimeDelta;
use diary_friends_service::common::error::AppError;
use diary_friends_service::common::state::AppState;
use diary_friends_service::models::friends::PeerRelation;
use diary_friends_service::models::relationships::RelationshipStatus;
use diary_friends_service::usecases::{notification_blocks, relationships};
use helpers::{profile, seeded};
use std::time::Duration;

async fn befriend(state: &AppState, requester_id: i64, target_id: i64) -> i64 {
    let request = relationships::send_request(state, requester_id, target_id)
        .await
        .unwrap();
    relationships::respond(state, request.relationship_id, target_id, true)
        .await
        .unwrap();
    request.relationship_id
}

#[tokio::test]
async fn friend_list_shows_the_other_side_newest_first() {
    let (backend, state) = seeded();
    befriend(&state, 1, 2).await;
    befriend(&state, 3, 1).await;
    backend.emotion_activity.mark_recorded(3);

    let friends = relationships::fetch_friends(&state, 1).await.unwrap();
    let ids: Vec<_> = friends.iter().map(|f| f.friend_id).collect();
    assert_eq!(ids, [3, 2]);

    let expected = profile(3);
    assert_eq!(friends[0].nickname, expected.nickname);
    assert_eq!(friends[0].connect_code, expected.connect_code);
    assert_eq!(friends[0].profile_image_url, expected.profile_image_url);
    assert!(friends[0].has_recorded_today);
    assert!(!friends[1].has_recorded_today);
    assert!(friends.iter().all(|f| !f.notification_blocked));

    let friends = relationships::fetch_friends(&state, 2).await.unwrap();
    assert_eq!(friends.len(), 1);
    assert_eq!(friends[0].friend_id, 1);
}

#[tokio::test]
async fn pending_requests_are_not_friends() {
    let (_backend, state) = seeded();
    relationships::send_request(&state, 1, 2).await.unwrap();
    assert!(relationships::fetch_friends(&state, 1).await.unwrap().is_empty());
    assert!(relationships::fetch_friends(&state, 2).await.unwrap().is_empty());
}

#[tokio::test]
async fn friend_list_flags_blocked_peers() {
    let (_backend, state) = seeded();
    befriend(&state, 1, 2).await;
    befriend(&state, 1, 3).await;
    notification_blocks::block(&state, 1, 2).await.unwrap();

    let friends = relationships::fetch_friends(&state, 1).await.unwrap();
    let blocked: Vec<_> = friends
        .iter()
        .filter(|f| f.notification_blocked)
        .map(|f| f.friend_id)
        .collect();
    assert_eq!(blocked, [2]);

    // The block belongs to user 1 only
    let friends = relationships::fetch_friends(&state, 2).await.unwrap();
    assert!(!friends[0].notification_blocked);
}

#[tokio::test]
async fn received_and_sent_lists_split_by_role() {
    let (_backend, state) = seeded();
    let older = relationships::send_request(&state, 2, 1).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;
    let newer = relationships::send_request(&state, 3, 1).await.unwrap();
    let outgoing = relationships::send_request(&state, 1, 4).await.unwrap();
    befriend(&state, 5, 1).await;

    let received = relationships::fetch_received(&state, 1).await.unwrap();
    let ids: Vec<_> = received.iter().map(|r| r.request_id).collect();
    assert_eq!(ids, [newer.relationship_id, older.relationship_id]);
    assert_eq!(received[0].requester_id, 3);
    assert_eq!(received[0].requester_nickname, "user-3");
    assert_eq!(received[0].requester_connect_code, "CODE-3");

    let sent = relationships::fetch_sent(&state, 1).await.unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].request_id, outgoing.relationship_id);
    assert_eq!(sent[0].receiver_id, 4);
    assert_eq!(sent[0].receiver_profile_image_url, profile(4).profile_image_url);

    assert_eq!(relationships::fetch_sent(&state, 2).await.unwrap().len(), 1);
    assert!(relationships::fetch_received(&state, 2).await.unwrap().is_empty());
}

#[tokio::test]
async fn settled_requests_leave_the_pending_lists() {
    let (_backend, state) = seeded();
    let request = relationships::send_request(&state, 2, 1).await.unwrap();
    relationships::respond(&state, request.relationship_id, 1, false)
        .await
        .unwrap();
    assert!(relationships::fetch_received(&state, 1).await.unwrap().is_empty());
    assert!(relationships::fetch_sent(&state, 2).await.unwrap().is_empty());
}

#[tokio::test]
async fn either_friend_can_remove_the_friendship() {
    let (backend, state) = seeded();
    befriend(&state, 1, 2).await;
    befriend(&state, 1, 3).await;

    relationships::remove(&state, 2, 1).await.unwrap();
    relationships::remove(&state, 1, 3).await.unwrap();

    assert!(relationships::fetch_friends(&state, 1).await.unwrap().is_empty());
    assert!(backend.relationships.rows().await.is_empty());

    // A removed pair starts over from a fresh request
    let again = relationships::send_request(&state, 2, 1).await.unwrap();
    assert_eq!(again.status, RelationshipStatus::Pending);
}

#[tokio::test]
async fn removing_a_non_friend_is_not_found() {
    let (backend, state) = seeded();
    let err = relationships::remove(&state, 1, 2).await.unwrap_err();
    assert!(matches!(err, AppError::RelationshipsNotFound));

    relationships::send_request(&state, 1, 2).await.unwrap();
    let err = relationships::remove(&state, 1, 2).await.unwrap_err();
    assert!(matches!(err, AppError::RelationshipsNotFound));
    assert_eq!(backend.relationships.rows().await.len(), 1);

    let err = relationships::remove(&state, 1, 1).await.unwrap_err();
    assert!(matches!(err, AppError::RelationshipsNotFound));
}

#[tokio::test]
async fn removal_keeps_notification_blocks() {
    let (backend, state) = seeded();
    befriend(&state, 1, 2).await;
    notification_blocks::block(&state, 1, 2).await.unwrap();

    relationships::remove(&state, 1, 2).await.unwrap();
    assert!(notification_blocks::is_blocked(&state, 1, 2).await.unwrap());
    assert_eq!(backend.notification_blocks.len(), 1);
}

#[tokio::test]
async fn status_is_seen_from_the_callers_side() {
    let (_backend, state) = seeded();
    let none = relationships::fetch_status(&state, 1, 2).await.unwrap();
    assert_eq!(none.relation, PeerRelation::None);
    assert_eq!(none.relationship_id, None);

    let request = relationships::send_request(&state, 1, 2).await.unwrap();
    let sent = relationships::fetch_status(&state, 1, 2).await.unwrap();
    assert_eq!(sent.relation, PeerRelation::RequestSent);
    assert_eq!(sent.relationship_id, Some(request.relationship_id));
    let received = relationships::fetch_status(&state, 2, 1).await.unwrap();
    assert_eq!(received.relation, PeerRelation::RequestReceived);

    relationships::respond(&state, request.relationship_id, 2, true)
        .await
        .unwrap();
    for (a, b) in [(1, 2), (2, 1)] {
        let friends = relationships::fetch_status(&state, a, b).await.unwrap();
        assert_eq!(friends.relation, PeerRelation::Friends);
    }

    let err = relationships::fetch_status(&state, 1, 1).await.unwrap_err();
    assert!(matches!(err, AppError::RelationshipsSelfRequest));
}

#[tokio::test]
async fn rejected_pair_reads_as_no_relation() {
    let (_backend, state) = seeded();
    let request = relationships::send_request(&state, 1, 2).await.unwrap();
    relationships::respond(&state, request.relationship_id, 2, false)
        .await
        .unwrap();
    let status = relationships::fetch_status(&state, 1, 2).await.unwrap();
    assert_eq!(status.relation, PeerRelation::None);
    assert_eq!(status.relationship_id, None);
}

#[tokio::test]
async fn friend_count_reports_the_limit() {
    let (_backend, state) = seeded();
    befriend(&state, 1, 2).await;
    befriend(&state, 3, 1).await;
    relationships::send_request(&state, 1, 4).await.unwrap();

    let count = relationships::fetch_friend_count(&state, 1).await.unwrap();
    assert_eq!(count.count, 2);
    assert_eq!(count.limit, relationships::MAX_FRIENDS);
    assert_eq!(relationships::fetch_friend_count(&state, 4).await.unwrap().count, 0);
}

#[tokio::test]
async fn blocking_is_idempotent_and_validated() {
    let (backend, state) = seeded();
    notification_blocks::block(&state, 1, 2).await.unwrap();
    notification_blocks::block(&state, 1, 2).await.unwrap();
    assert_eq!(backend.notification_blocks.len(), 1);
    assert!(notification_blocks::is_blocked(&state, 1, 2).await.unwrap());
    assert!(!notification_blocks::is_blocked(&state, 2, 1).await.unwrap());

    notification_blocks::unblock(&state, 1, 2).await.unwrap();
    notification_blocks::unblock(&state, 1, 2).await.unwrap();
    assert!(backend.notification_blocks.is_empty());

    let err = notification_blocks::block(&state, 1, 1).await.unwrap_err();
    assert!(matches!(err, AppError::NotificationBlocksSelfTarget));
    let err = notification_blocks::unblock(&state, 1, 1).await.unwrap_err();
    assert!(matches!(err, AppError::NotificationBlocksSelfTarget));
    let err = notification_blocks::block(&state, 1, 404).await.unwrap_err();
    assert!(matches!(err, AppError::UsersNotFound));
}

#[tokio::test]
async fn purge_drops_only_old_terminal_history() {
    let (backend, state) = seeded();
    let rejected = relationships::send_request(&state, 1, 2).await.unwrap();
    relationships::respond(&state, rejected.relationship_id, 2, false)
        .await
        .unwrap();
    let cancelled = relationships::send_request(&state, 1, 3).await.unwrap();
    relationships::cancel(&state, cancelled.relationship_id, 1)
        .await
        .unwrap();
    relationships::send_request(&state, 1, 4).await.unwrap();
    befriend(&state, 1, 5).await;

    let purged = relationships::purge_history(&state, TimeDelta::days(90))
        .await
        .unwrap();
    assert_eq!(purged, 0);

    tokio::time::sleep(Duration::from_millis(5)).await;
    let purged = relationships::purge_history(&state, TimeDelta::zero())
        .await
        .unwrap();
    assert_eq!(purged, 2);

    let statuses: Vec<_> = backend
        .relationships
        .rows()
        .await
        .into_iter()
        .map(|row| row.status)
        .collect();
    assert_eq!(
        statuses,
        [RelationshipStatus::Pending, RelationshipStatus::Accepted]
    );
}

#[tokio::test]
async fn negative_retention_purges_nothing() {
    let (backend, state) = seeded();
    let request = relationships::send_request(&state, 1, 2).await.unwrap();
    relationships::cancel(&state, request.relationship_id, 1)
        .await
        .unwrap();

    let err = relationships::purge_history(&state, TimeDelta::days(-1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InternalServerError(_)));
    assert_eq!(backend.relationships.rows().await.len(), 1);
}

#[tokio::test]
async fn retention_beyond_the_calendar_fails_instead_of_panicking() {
    let (backend, state) = seeded();
    let request = relationships::send_request(&state, 1, 2).await.unwrap();
    relationships::respond(&state, request.relationship_id, 2, false)
        .await
        .unwrap();

    let err = relationships::purge_history(&state, TimeDelta::days(100_000_000))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InternalServerError(_)));
    assert_eq!(backend.relationships.rows().await.len(), 1);
}
