use crate::common::env::FromEnv;
use chrono::{FixedOffset, TimeDelta};
use std::env;
use std::net::IpAddr;
use std::ops::Deref;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::Level;

pub struct AppSettings {
    pub app_component: String,
    pub level: Level,
    pub app_host: IpAddr,
    pub app_port: u16,

    pub database_url: String,
    pub db_max_connections: usize,
    pub db_wait_timeout: Duration,
    pub db_run_migrations: bool,

    pub redis_url: String,
    pub redis_max_connections: usize,
    pub redis_connection_timeout: Duration,
    pub redis_response_timeout: Duration,
    pub redis_wait_timeout: Duration,

    /// Offset of the diary's calendar day from UTC, used for "recorded today".
    pub diary_utc_offset: FixedOffset,
    pub relationship_history_retention: TimeDelta,
}

impl AppSettings {
    pub fn load_from_env() -> anyhow::Result<Self> {
        let _ = dotenv::dotenv();

        let app_component = env::var("APP_COMPONENT")?;
        let level = Level::from_env("LOG_LEVEL")?;
        let app_host = IpAddr::from_env("APP_HOST")?;
        let app_port = u16::from_env("APP_PORT")?;

        let database_url = env::var("DATABASE_URL")?;
        let db_max_connections = usize::from_env("DB_MAX_CONNECTIONS")?;
        let db_wait_timeout_secs = u64::from_env("DB_WAIT_TIMEOUT_SECS")?;
        let db_wait_timeout = Duration::from_secs(db_wait_timeout_secs);
        let db_run_migrations = bool::from_env_or("DB_RUN_MIGRATIONS", false)?;

        let redis_url = env::var("REDIS_URL")?;
        let redis_max_connections = usize::from_env("REDIS_MAX_CONNECTIONS")?;
        let redis_connection_timeout_secs = u64::from_env("REDIS_CONNECTION_TIMEOUT_SECS")?;
        let redis_connection_timeout = Duration::from_secs(redis_connection_timeout_secs);
        let redis_response_timeout_secs = u64::from_env("REDIS_RESPONSE_TIMEOUT_SECS")?;
        let redis_response_timeout = Duration::from_secs(redis_response_timeout_secs);
        let redis_wait_timeout_secs = u64::from_env("REDIS_WAIT_TIMEOUT_SECS")?;
        let redis_wait_timeout = Duration::from_secs(redis_wait_timeout_secs);

        let diary_utc_offset_minutes = i32::from_env_or("DIARY_UTC_OFFSET_MINUTES", 0)?;
        let diary_utc_offset = FixedOffset::east_opt(diary_utc_offset_minutes * 60)
            .ok_or_else(|| anyhow::anyhow!("DIARY_UTC_OFFSET_MINUTES is out of range"))?;
        let retention_days = i64::from_env_or("RELATIONSHIP_HISTORY_RETENTION_DAYS", 90)?;
        let relationship_history_retention = retention_from_days(retention_days)?;

        Ok(AppSettings {
            app_component,
            level,
            app_port,
            app_host,

            database_url,
            db_max_connections,
            db_wait_timeout,
            db_run_migrations,

            redis_url,
            redis_max_connections,
            redis_connection_timeout,
            redis_response_timeout,
            redis_wait_timeout,

            diary_utc_offset,
            relationship_history_retention,
        })
    }

    pub fn get() -> &'static AppSettings {
        settings()
    }
}

fn retention_from_days(days: i64) -> anyhow::Result<TimeDelta> {
    if days < 0 {
        anyhow::bail!("RELATIONSHIP_HISTORY_RETENTION_DAYS must not be negative, got {days}");
    }
    TimeDelta::try_days(days)
        .ok_or_else(|| anyhow::anyhow!("RELATIONSHIP_HISTORY_RETENTION_DAYS is out of range"))
}

pub fn settings() -> &'static AppSettings {
    static SETTINGS: LazyLock<AppSettings> =
        LazyLock::new(|| AppSettings::load_from_env().expect("Failed to load settings"));
    SETTINGS.deref()
}
