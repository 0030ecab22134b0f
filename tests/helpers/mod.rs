//! Shared fixtures for the integration tests.
//!
//! Every test gets its own in-memory backend seeded with users `1..=USER_COUNT`.
//! User `n` is nicknamed `user-n` and has connect code `CODE-n`.

#![allow(dead_code)]

use diary_friends_service::common::state::AppState;
use diary_friends_service::models::notifications::Notification;
use diary_friends_service::models::users::UserProfile;
use diary_friends_service::repositories::memory::MemoryBackend;
use std::time::Duration;

pub const USER_COUNT: i64 = 10;

pub fn profile(user_id: i64) -> UserProfile {
    UserProfile {
        user_id,
        nickname: format!("user-{user_id}"),
        connect_code: format!("CODE-{user_id}"),
        profile_image_url: (user_id % 2 == 0).then(|| format!("https://img.test/{user_id}.png")),
    }
}

pub fn seeded_backend() -> MemoryBackend {
    let backend = MemoryBackend::new();
    for user_id in 1..=USER_COUNT {
        backend.users.insert(profile(user_id));
    }
    backend
}

pub fn seeded() -> (MemoryBackend, AppState) {
    let backend = seeded_backend();
    let state = backend.state();
    (backend, state)
}

/// Polls until the recording dispatcher holds `count` notifications or a
/// second passes. Delivery runs on a spawned task.
pub async fn wait_for_notifications(backend: &MemoryBackend, count: usize) -> Vec<Notification> {
    for _ in 0..100 {
        let delivered = backend.notifier.delivered();
        if delivered.len() >= count {
            return delivered;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    backend.notifier.delivered()
}

/// Lets spawned deliveries run, for asserting that nothing was sent.
pub async fn settle_deliveries() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
}
