//! HTTP surface: routing, caller identity, status codes and JSON shapes.

mod helpers;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use diary_friends_service::api;
use diary_friends_service::common::identity::USER_ID_HEADER;
use diary_friends_service::common::state::AppState;
use diary_friends_service::usecases::relationships;
use helpers::seeded;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app(state: AppState) -> Router {
    api::router().with_state(state)
}

async fn call(
    state: &AppState,
    method: Method,
    uri: &str,
    caller: Option<i64>,
    body: Option<Value>,
) -> (StatusCode, Option<Value>) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user_id) = caller {
        request = request.header(USER_ID_HEADER, user_id.to_string());
    }
    let request = match body {
        Some(body) => request
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = (!bytes.is_empty()).then(|| serde_json::from_slice(&bytes).unwrap());
    (status, json)
}

#[tokio::test]
async fn requests_without_a_caller_are_unauthorized() {
    let (_backend, state) = seeded();
    let (status, body) = call(&state, Method::GET, "/api/v1/friends", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body.unwrap()["code"], "unauthorized");
}

#[tokio::test]
async fn friend_request_flow_over_http() {
    let (_backend, state) = seeded();

    let (status, body) = call(
        &state,
        Method::POST,
        "/api/v1/friend-requests",
        Some(1),
        Some(json!({ "targetId": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_none());

    let (status, body) = call(
        &state,
        Method::GET,
        "/api/v1/friend-requests/received",
        Some(2),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let received = body.unwrap();
    assert_eq!(received[0]["requesterId"], 1);
    assert_eq!(received[0]["requesterNickname"], "user-1");
    let request_id = received[0]["requestId"].as_i64().unwrap();

    let (status, _) = call(
        &state,
        Method::POST,
        &format!("/api/v1/friend-requests/{request_id}/accept"),
        Some(2),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = call(&state, Method::GET, "/api/v1/friends", Some(1), None).await;
    assert_eq!(status, StatusCode::OK);
    let friends = body.unwrap();
    assert_eq!(friends[0]["friendId"], 2);
    assert_eq!(friends[0]["hasRecordedToday"], false);
    assert_eq!(friends[0]["notificationBlocked"], false);

    let (_, body) = call(&state, Method::GET, "/api/v1/friends/count", Some(2), None).await;
    assert_eq!(body.unwrap(), json!({ "count": 1, "limit": 5 }));

    let (_, body) = call(&state, Method::GET, "/api/v1/friends/2/status", Some(1), None).await;
    let status_view = body.unwrap();
    assert_eq!(status_view["relation"], "FRIENDS");
    assert_eq!(status_view["relationshipId"], request_id);

    let (status, _) = call(&state, Method::DELETE, "/api/v1/friends/1", Some(2), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = call(&state, Method::GET, "/api/v1/friends/2/status", Some(1), None).await;
    assert_eq!(body.unwrap()["relation"], "NONE");
}

#[tokio::test]
async fn send_by_connect_code_and_list_sent() {
    let (_backend, state) = seeded();
    let (status, _) = call(
        &state,
        Method::POST,
        "/api/v1/friend-requests",
        Some(3),
        Some(json!({ "connectCode": "CODE-4" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = call(&state, Method::GET, "/api/v1/friend-requests/sent", Some(3), None).await;
    let sent = body.unwrap();
    assert_eq!(sent.as_array().unwrap().len(), 1);
    assert_eq!(sent[0]["receiverId"], 4);
    assert_eq!(sent[0]["receiverConnectCode"], "CODE-4");
    assert_eq!(sent[0]["receiverProfileImageUrl"], "https://img.test/4.png");
}

#[tokio::test]
async fn malformed_send_bodies_are_bad_requests() {
    let (_backend, state) = seeded();
    for body in [
        json!({}),
        json!({ "targetId": 2, "connectCode": "CODE-2" }),
        json!({ "targetId": "two" }),
    ] {
        let (status, response) = call(
            &state,
            Method::POST,
            "/api/v1/friend-requests",
            Some(1),
            Some(body.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(response.unwrap()["code"], "decoding_request_failed");
    }
}

#[tokio::test]
async fn domain_errors_map_to_status_codes() {
    let (_backend, state) = seeded();
    let request = relationships::send_request(&state, 1, 2).await.unwrap();
    let request_id = request.relationship_id;

    let cases = [
        (Method::POST, "/api/v1/friend-requests".to_owned(), 1, Some(json!({ "targetId": 1 })), StatusCode::BAD_REQUEST, "relationships.self_request"),
        (Method::POST, "/api/v1/friend-requests".to_owned(), 2, Some(json!({ "targetId": 1 })), StatusCode::CONFLICT, "relationships.request_exists"),
        (Method::POST, "/api/v1/friend-requests".to_owned(), 1, Some(json!({ "targetId": 99 })), StatusCode::NOT_FOUND, "users.not_found"),
        (Method::POST, format!("/api/v1/friend-requests/{request_id}/accept"), 3, None, StatusCode::FORBIDDEN, "relationships.forbidden"),
        (Method::POST, "/api/v1/friend-requests/9999/reject".to_owned(), 2, None, StatusCode::NOT_FOUND, "relationships.not_found"),
        (Method::DELETE, "/api/v1/friends/2".to_owned(), 1, None, StatusCode::NOT_FOUND, "relationships.not_found"),
        (Method::POST, "/api/v1/friends/1/notification-block".to_owned(), 1, None, StatusCode::BAD_REQUEST, "notification_blocks.self_target"),
    ];
    for (method, uri, caller, body, expected_status, expected_code) in cases {
        let (status, response) = call(&state, method, &uri, Some(caller), body).await;
        assert_eq!(status, expected_status, "{uri}");
        assert_eq!(response.unwrap()["code"], expected_code, "{uri}");
    }

    let (status, _) = call(
        &state,
        Method::DELETE,
        &format!("/api/v1/friend-requests/{request_id}"),
        Some(1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, response) = call(
        &state,
        Method::POST,
        &format!("/api/v1/friend-requests/{request_id}/accept"),
        Some(2),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(response.unwrap()["code"], "relationships.not_pending");
}

#[tokio::test]
async fn notification_block_toggles_the_friend_flag() {
    let (_backend, state) = seeded();
    let request = relationships::send_request(&state, 1, 2).await.unwrap();
    relationships::respond(&state, request.relationship_id, 2, true)
        .await
        .unwrap();

    let (status, _) = call(
        &state,
        Method::POST,
        "/api/v1/friends/2/notification-block",
        Some(1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = call(&state, Method::GET, "/api/v1/friends", Some(1), None).await;
    assert_eq!(body.unwrap()[0]["notificationBlocked"], true);

    let (status, _) = call(
        &state,
        Method::DELETE,
        "/api/v1/friends/2/notification-block",
        Some(1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = call(&state, Method::GET, "/api/v1/friends", Some(1), None).await;
    assert_eq!(body.unwrap()[0]["notificationBlocked"], false);
}
