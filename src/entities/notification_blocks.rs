use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct NotificationBlock {
    pub subscriber_id: i64,
    pub blocked_peer_id: i64,
    pub created_at: DateTime<Utc>,
}
