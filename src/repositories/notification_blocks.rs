use crate::entities::notification_blocks::NotificationBlock as NotificationBlockEntity;
use crate::models::notification_blocks::NotificationBlock;
use crate::repositories::StoreResult;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySql, Pool};

/// (subscriber, blocked peer) suppression pairs. Insert and delete are idempotent.
#[async_trait]
pub trait NotificationBlockStore: Send + Sync {
    async fn exists(&self, subscriber_id: i64, peer_id: i64) -> StoreResult<bool>;

    async fn insert(&self, subscriber_id: i64, peer_id: i64) -> StoreResult<()>;

    async fn delete(&self, subscriber_id: i64, peer_id: i64) -> StoreResult<()>;

    async fn fetch_by_subscriber(&self, subscriber_id: i64)
    -> StoreResult<Vec<NotificationBlock>>;
}

const TABLE_NAME: &str = "friend_notification_blocks";
const READ_FIELDS: &str = "subscriber_id, blocked_peer_id, created_at";

pub struct MySqlNotificationBlockStore {
    db: Pool<MySql>,
}

impl MySqlNotificationBlockStore {
    pub fn new(db: Pool<MySql>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationBlockStore for MySqlNotificationBlockStore {
    async fn exists(&self, subscriber_id: i64, peer_id: i64) -> StoreResult<bool> {
        const QUERY: &str = const_str::concat!(
            "SELECT COUNT(*) FROM ",
            TABLE_NAME,
            " WHERE subscriber_id = ? AND blocked_peer_id = ?"
        );
        let count: i64 = sqlx::query_scalar(QUERY)
            .bind(subscriber_id)
            .bind(peer_id)
            .fetch_one(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn insert(&self, subscriber_id: i64, peer_id: i64) -> StoreResult<()> {
        const QUERY: &str = const_str::concat!(
            "INSERT INTO ",
            TABLE_NAME,
            " (subscriber_id, blocked_peer_id, created_at) VALUES (?, ?, ?)",
            " ON DUPLICATE KEY UPDATE subscriber_id = subscriber_id"
        );
        sqlx::query(QUERY)
            .bind(subscriber_id)
            .bind(peer_id)
            .bind(Utc::now())
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn delete(&self, subscriber_id: i64, peer_id: i64) -> StoreResult<()> {
        const QUERY: &str = const_str::concat!(
            "DELETE FROM ",
            TABLE_NAME,
            " WHERE subscriber_id = ? AND blocked_peer_id = ?"
        );
        sqlx::query(QUERY)
            .bind(subscriber_id)
            .bind(peer_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn fetch_by_subscriber(
        &self,
        subscriber_id: i64,
    ) -> StoreResult<Vec<NotificationBlock>> {
        const QUERY: &str = const_str::concat!(
            "SELECT ",
            READ_FIELDS,
            " FROM ",
            TABLE_NAME,
            " WHERE subscriber_id = ? ORDER BY created_at DESC"
        );
        let blocks: Vec<NotificationBlockEntity> = sqlx::query_as(QUERY)
            .bind(subscriber_id)
            .fetch_all(&self.db)
            .await?;
        Ok(blocks.into_iter().map(NotificationBlock::from).collect())
    }
}
