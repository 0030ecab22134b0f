use crate::entities::notification_blocks::NotificationBlock as NotificationBlockEntity;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationBlock {
    // The user that no longer wants to hear about `blocked_peer_id`
    pub subscriber_id: i64,
    pub blocked_peer_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationBlockEntity> for NotificationBlock {
    fn from(value: NotificationBlockEntity) -> Self {
        Self {
            subscriber_id: value.subscriber_id,
            blocked_peer_id: value.blocked_peer_id,
            created_at: value.created_at,
        }
    }
}
