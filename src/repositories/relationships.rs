use crate::entities::relationships::Relationship as RelationshipEntity;
use crate::models::relationships::{NewRelationship, Relationship, RelationshipStatus, UserPair};
use crate::repositories::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySql, Pool, Transaction};

/// Durable relationship rows, at most one non-terminal row per [`UserPair`].
///
/// Reads on the store itself are plain snapshot reads meant for views.
/// Anything that mutates goes through a [`RelationshipTx`].
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn RelationshipTx>>;

    async fn find_by_id(&self, relationship_id: i64) -> StoreResult<Option<Relationship>>;

    /// The pending or accepted row of the pair, if any.
    async fn find_pair(&self, pair: UserPair) -> StoreResult<Option<Relationship>>;

    async fn count_accepted(&self, user_id: i64) -> StoreResult<u64>;

    /// Accepted relationships of `user_id`, most recently accepted first.
    async fn list_accepted(&self, user_id: i64) -> StoreResult<Vec<Relationship>>;

    /// Pending relationships where `user_id` is the receiver (or the requester
    /// when `as_receiver` is false), newest first.
    async fn list_pending(&self, user_id: i64, as_receiver: bool)
    -> StoreResult<Vec<Relationship>>;

    /// Deletes rejected and cancelled rows last updated before `cutoff`.
    async fn purge_terminal_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64>;
}

/// One atomic unit of work. Reads lock what they return until commit;
/// dropping the handle without committing rolls everything back.
#[async_trait]
pub trait RelationshipTx: Send {
    /// Serializes this transaction against every other transaction that
    /// touches either participant's friend capacity.
    async fn lock_participants(&mut self, pair: UserPair) -> StoreResult<()>;

    async fn find_by_id(&mut self, relationship_id: i64) -> StoreResult<Option<Relationship>>;

    /// Every row of the pair, terminal history included.
    async fn find_pair(&mut self, pair: UserPair) -> StoreResult<Vec<Relationship>>;

    async fn count_accepted(&mut self, user_id: i64) -> StoreResult<u64>;

    /// Fails with [`StoreError::PairConflict`] when the pair already has a
    /// non-terminal row.
    async fn insert(&mut self, relationship: NewRelationship) -> StoreResult<Relationship>;

    /// Persists the status and `updated_at` of an existing row.
    async fn save(&mut self, relationship: &Relationship) -> StoreResult<()>;

    async fn delete(&mut self, relationship_id: i64) -> StoreResult<()>;

    /// Drops the rejected/cancelled history of the pair.
    async fn delete_terminal(&mut self, pair: UserPair) -> StoreResult<u64>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

const TABLE_NAME: &str = "relationships";
const READ_FIELDS: &str =
    "id, user_low, user_high, requester_id, status, created_at, updated_at";

fn into_models(rows: Vec<RelationshipEntity>) -> StoreResult<Vec<Relationship>> {
    rows.into_iter()
        .map(|row| Relationship::try_from(row).map_err(StoreError::from))
        .collect()
}

pub struct MySqlRelationshipStore {
    db: Pool<MySql>,
}

impl MySqlRelationshipStore {
    pub fn new(db: Pool<MySql>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RelationshipStore for MySqlRelationshipStore {
    async fn begin(&self) -> StoreResult<Box<dyn RelationshipTx>> {
        let tx = self.db.begin().await?;
        Ok(Box::new(MySqlRelationshipTx { tx }))
    }

    async fn find_by_id(&self, relationship_id: i64) -> StoreResult<Option<Relationship>> {
        const QUERY: &str = const_str::concat!(
            "SELECT ",
            READ_FIELDS,
            " FROM ",
            TABLE_NAME,
            " WHERE id = ?"
        );
        let row: Option<RelationshipEntity> = sqlx::query_as(QUERY)
            .bind(relationship_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Relationship::try_from).transpose()?)
    }

    async fn find_pair(&self, pair: UserPair) -> StoreResult<Option<Relationship>> {
        const QUERY: &str = const_str::concat!(
            "SELECT ",
            READ_FIELDS,
            " FROM ",
            TABLE_NAME,
            " WHERE user_low = ? AND user_high = ? AND status IN ('PENDING', 'ACCEPTED')"
        );
        let row: Option<RelationshipEntity> = sqlx::query_as(QUERY)
            .bind(pair.low())
            .bind(pair.high())
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Relationship::try_from).transpose()?)
    }

    async fn count_accepted(&self, user_id: i64) -> StoreResult<u64> {
        const QUERY: &str = const_str::concat!(
            "SELECT COUNT(*) FROM ",
            TABLE_NAME,
            " WHERE (user_low = ? OR user_high = ?) AND status = 'ACCEPTED'"
        );
        let count: i64 = sqlx::query_scalar(QUERY)
            .bind(user_id)
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;
        Ok(count as _)
    }

    async fn list_accepted(&self, user_id: i64) -> StoreResult<Vec<Relationship>> {
        const QUERY: &str = const_str::concat!(
            "SELECT ",
            READ_FIELDS,
            " FROM ",
            TABLE_NAME,
            " WHERE (user_low = ? OR user_high = ?) AND status = 'ACCEPTED'",
            " ORDER BY updated_at DESC, id DESC"
        );
        let rows = sqlx::query_as(QUERY)
            .bind(user_id)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;
        into_models(rows)
    }

    async fn list_pending(
        &self,
        user_id: i64,
        as_receiver: bool,
    ) -> StoreResult<Vec<Relationship>> {
        const RECEIVED_QUERY: &str = const_str::concat!(
            "SELECT ",
            READ_FIELDS,
            " FROM ",
            TABLE_NAME,
            " WHERE (user_low = ? OR user_high = ?) AND status = 'PENDING' AND requester_id <> ?",
            " ORDER BY created_at DESC, id DESC"
        );
        const SENT_QUERY: &str = const_str::concat!(
            "SELECT ",
            READ_FIELDS,
            " FROM ",
            TABLE_NAME,
            " WHERE (user_low = ? OR user_high = ?) AND status = 'PENDING' AND requester_id = ?",
            " ORDER BY created_at DESC, id DESC"
        );
        let query = match as_receiver {
            true => RECEIVED_QUERY,
            false => SENT_QUERY,
        };
        let rows = sqlx::query_as(query)
            .bind(user_id)
            .bind(user_id)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;
        into_models(rows)
    }

    async fn purge_terminal_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        const QUERY: &str = const_str::concat!(
            "DELETE FROM ",
            TABLE_NAME,
            " WHERE status IN ('REJECTED', 'CANCELLED') AND updated_at < ?"
        );
        let result = sqlx::query(QUERY).bind(cutoff).execute(&self.db).await?;
        Ok(result.rows_affected())
    }
}

pub struct MySqlRelationshipTx {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl RelationshipTx for MySqlRelationshipTx {
    async fn lock_participants(&mut self, pair: UserPair) -> StoreResult<()> {
        // Ascending id order so two transactions never wait on each other crosswise
        const QUERY: &str = "SELECT id FROM users WHERE id IN (?, ?) ORDER BY id FOR UPDATE";
        sqlx::query(QUERY)
            .bind(pair.low())
            .bind(pair.high())
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn find_by_id(&mut self, relationship_id: i64) -> StoreResult<Option<Relationship>> {
        const QUERY: &str = const_str::concat!(
            "SELECT ",
            READ_FIELDS,
            " FROM ",
            TABLE_NAME,
            " WHERE id = ? FOR UPDATE"
        );
        let row: Option<RelationshipEntity> = sqlx::query_as(QUERY)
            .bind(relationship_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(Relationship::try_from).transpose()?)
    }

    async fn find_pair(&mut self, pair: UserPair) -> StoreResult<Vec<Relationship>> {
        const QUERY: &str = const_str::concat!(
            "SELECT ",
            READ_FIELDS,
            " FROM ",
            TABLE_NAME,
            " WHERE user_low = ? AND user_high = ? FOR UPDATE"
        );
        let rows = sqlx::query_as(QUERY)
            .bind(pair.low())
            .bind(pair.high())
            .fetch_all(&mut *self.tx)
            .await?;
        into_models(rows)
    }

    async fn count_accepted(&mut self, user_id: i64) -> StoreResult<u64> {
        // Locking read, split per column so each half stays on its own index
        // and only that user's accepted rows get locked
        const QUERY: &str = const_str::concat!(
            "(SELECT id FROM ",
            TABLE_NAME,
            " WHERE user_low = ? AND status = 'ACCEPTED' FOR UPDATE)",
            " UNION ALL ",
            "(SELECT id FROM ",
            TABLE_NAME,
            " WHERE user_high = ? AND status = 'ACCEPTED' FOR UPDATE)"
        );
        let rows = sqlx::query(QUERY)
            .bind(user_id)
            .bind(user_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows.len() as _)
    }

    async fn insert(&mut self, relationship: NewRelationship) -> StoreResult<Relationship> {
        const QUERY: &str = const_str::concat!(
            "INSERT INTO ",
            TABLE_NAME,
            " (user_low, user_high, requester_id, status, created_at, updated_at)",
            " VALUES (?, ?, ?, ?, ?, ?)"
        );
        let result = sqlx::query(QUERY)
            .bind(relationship.pair.low())
            .bind(relationship.pair.high())
            .bind(relationship.requester_id)
            .bind(RelationshipStatus::Pending.as_str())
            .bind(relationship.created_at)
            .bind(relationship.created_at)
            .execute(&mut *self.tx)
            .await;
        match result {
            Ok(result) => Ok(relationship.into_relationship(result.last_insert_id() as _)),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::PairConflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&mut self, relationship: &Relationship) -> StoreResult<()> {
        const QUERY: &str = const_str::concat!(
            "UPDATE ",
            TABLE_NAME,
            " SET status = ?, updated_at = ? WHERE id = ?"
        );
        let result = sqlx::query(QUERY)
            .bind(relationship.status.as_str())
            .bind(relationship.updated_at)
            .bind(relationship.relationship_id)
            .execute(&mut *self.tx)
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::PairConflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&mut self, relationship_id: i64) -> StoreResult<()> {
        const QUERY: &str = const_str::concat!("DELETE FROM ", TABLE_NAME, " WHERE id = ?");
        sqlx::query(QUERY)
            .bind(relationship_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_terminal(&mut self, pair: UserPair) -> StoreResult<u64> {
        const QUERY: &str = const_str::concat!(
            "DELETE FROM ",
            TABLE_NAME,
            " WHERE user_low = ? AND user_high = ? AND status IN ('REJECTED', 'CANCELLED')"
        );
        let result = sqlx::query(QUERY)
            .bind(pair.low())
            .bind(pair.high())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
