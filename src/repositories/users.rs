use crate::entities::users::User;
use crate::models::users::UserProfile;
use crate::repositories::StoreResult;
use async_trait::async_trait;
use sqlx::{MySql, Pool};

/// Read-only view of the account directory owned by the identity service.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn exists(&self, user_id: i64) -> StoreResult<bool> {
        Ok(self.fetch_one(user_id).await?.is_some())
    }

    async fn fetch_one(&self, user_id: i64) -> StoreResult<Option<UserProfile>>;

    async fn fetch_one_by_connect_code(&self, connect_code: &str)
    -> StoreResult<Option<UserProfile>>;
}

const TABLE_NAME: &str = "users";
const READ_FIELDS: &str = "id, nickname, connect_code, profile_image_url";

pub struct MySqlUserDirectory {
    db: Pool<MySql>,
}

impl MySqlUserDirectory {
    pub fn new(db: Pool<MySql>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserDirectory for MySqlUserDirectory {
    async fn exists(&self, user_id: i64) -> StoreResult<bool> {
        const QUERY: &str = const_str::concat!("SELECT COUNT(*) FROM ", TABLE_NAME, " WHERE id = ?");
        let count: i64 = sqlx::query_scalar(QUERY)
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn fetch_one(&self, user_id: i64) -> StoreResult<Option<UserProfile>> {
        const QUERY: &str = const_str::concat!(
            "SELECT ",
            READ_FIELDS,
            " FROM ",
            TABLE_NAME,
            " WHERE id = ?"
        );
        let user: Option<User> = sqlx::query_as(QUERY)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user.map(UserProfile::from))
    }

    async fn fetch_one_by_connect_code(
        &self,
        connect_code: &str,
    ) -> StoreResult<Option<UserProfile>> {
        const QUERY: &str = const_str::concat!(
            "SELECT ",
            READ_FIELDS,
            " FROM ",
            TABLE_NAME,
            " WHERE connect_code = ?"
        );
        let user: Option<User> = sqlx::query_as(QUERY)
            .bind(connect_code)
            .fetch_optional(&self.db)
            .await?;
        Ok(user.map(UserProfile::from))
    }
}
