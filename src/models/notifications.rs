use crate::models::users::UserProfile;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    FriendRequest,
    FriendAccepted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub recipient_id: i64,
    pub sender_id: i64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_id: i64,
}

impl Notification {
    pub fn friend_request(recipient_id: i64, sender: &UserProfile, relationship_id: i64) -> Self {
        Self {
            recipient_id,
            sender_id: sender.user_id,
            kind: NotificationKind::FriendRequest,
            title: "New friend request".to_owned(),
            message: format!("{} sent you a friend request.", sender.nickname),
            related_id: relationship_id,
        }
    }

    pub fn friend_accepted(recipient_id: i64, sender: &UserProfile, relationship_id: i64) -> Self {
        Self {
            recipient_id,
            sender_id: sender.user_id,
            kind: NotificationKind::FriendAccepted,
            title: "Friend request accepted".to_owned(),
            message: format!("{} accepted your friend request.", sender.nickname),
            related_id: relationship_id,
        }
    }
}
