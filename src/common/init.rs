use crate::adapters::notifications::RedisNotificationDispatcher;
use crate::common::redis_pool::{self, RedisPool};
use crate::common::state::AppState;
use crate::repositories::emotion_records::MySqlEmotionActivity;
use crate::repositories::notification_blocks::MySqlNotificationBlockStore;
use crate::repositories::relationships::MySqlRelationshipStore;
use crate::repositories::users::MySqlUserDirectory;
use crate::settings::AppSettings;
use redis::Commands;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use tracing::info;

pub fn initialize_logging(settings: &AppSettings) {
    tracing_subscriber::fmt()
        .with_max_level(settings.level)
        .with_timer(tracing_subscriber::fmt::time())
        .with_level(true)
        .compact()
        .init();
}

pub async fn initialize_state(settings: &AppSettings) -> anyhow::Result<AppState> {
    let db = initialize_db(settings).await?;
    if settings.db_run_migrations {
        sqlx::migrate!("./migrations").run(&db).await?;
        info!("Database migrations applied");
    }
    let redis = initialize_redis(settings)?;
    Ok(AppState {
        relationships: Arc::new(MySqlRelationshipStore::new(db.clone())),
        notification_blocks: Arc::new(MySqlNotificationBlockStore::new(db.clone())),
        users: Arc::new(MySqlUserDirectory::new(db.clone())),
        emotion_activity: Arc::new(MySqlEmotionActivity::new(db, settings.diary_utc_offset)),
        notifier: Arc::new(RedisNotificationDispatcher::new(redis)),
    })
}

pub fn initialize_db(settings: &AppSettings) -> impl Future<Output = sqlx::Result<Pool<MySql>>> {
    MySqlPoolOptions::new()
        .acquire_timeout(settings.db_wait_timeout)
        .max_connections(settings.db_max_connections as _)
        .connect(&settings.database_url)
}

pub fn initialize_redis(settings: &AppSettings) -> anyhow::Result<RedisPool> {
    let redis_client = redis::Client::open(settings.redis_url.as_str())?;
    let mut conn = redis_client.get_connection_with_timeout(settings.redis_wait_timeout)?;
    let _: () = conn.ping()?;
    redis_pool::build_pool(redis_client, settings)
}
