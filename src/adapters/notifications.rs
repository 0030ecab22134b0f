use crate::common::redis_pool::RedisPool;
use crate::models::notifications::Notification;
use async_trait::async_trait;
use redis::AsyncCommands;

/// Outbound delivery of user notifications. Delivery is best effort.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}

pub const NOTIFICATIONS_CHANNEL: &str = "diary:notifications";

/// Publishes notifications for the push gateway to pick up.
pub struct RedisNotificationDispatcher {
    redis: RedisPool,
}

impl RedisNotificationDispatcher {
    pub fn new(redis: RedisPool) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl NotificationDispatcher for RedisNotificationDispatcher {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        let payload = serde_json::to_string(notification)?;
        let mut redis = self.redis.get().await?;
        let receivers: i64 = redis.publish(NOTIFICATIONS_CHANNEL, payload).await?;
        if receivers == 0 {
            tracing::warn!(
                recipient_id = notification.recipient_id,
                "No subscriber is listening on {NOTIFICATIONS_CHANNEL}"
            );
        }
        Ok(())
    }
}
