pub mod friend_requests;
pub mod friends;

use crate::common::state::AppState;
use axum::Router;
use axum::routing::{delete, get, post};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/friends", get(friends::list))
        .route("/friends/count", get(friends::count))
        .route("/friends/{user_id}", delete(friends::remove))
        .route("/friends/{user_id}/status", get(friends::status))
        .route(
            "/friends/{user_id}/notification-block",
            post(friends::block_notifications).delete(friends::unblock_notifications),
        )
        .route("/friend-requests", post(friend_requests::send))
        .route("/friend-requests/received", get(friend_requests::received))
        .route("/friend-requests/sent", get(friend_requests::sent))
        .route("/friend-requests/{request_id}", delete(friend_requests::cancel))
        .route(
            "/friend-requests/{request_id}/accept",
            post(friend_requests::accept),
        )
        .route(
            "/friend-requests/{request_id}/reject",
            post(friend_requests::reject),
        )
}
