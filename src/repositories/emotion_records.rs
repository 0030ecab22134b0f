use crate::repositories::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveTime, TimeDelta, Utc};
use sqlx::{MySql, Pool};

/// Answers whether a user has written an emotion record on the current diary day.
#[async_trait]
pub trait EmotionActivity: Send + Sync {
    async fn has_recorded_today(&self, user_id: i64) -> StoreResult<bool>;
}

/// Start of the calendar day containing `now`, as seen from `offset`, in UTC.
pub fn start_of_day_utc(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local_midnight = now
        .with_timezone(&offset)
        .date_naive()
        .and_time(NaiveTime::MIN);
    let offset_seconds = TimeDelta::seconds(offset.local_minus_utc() as _);
    DateTime::from_naive_utc_and_offset(local_midnight - offset_seconds, Utc)
}

const TABLE_NAME: &str = "emotion_records";

pub struct MySqlEmotionActivity {
    db: Pool<MySql>,
    day_offset: FixedOffset,
}

impl MySqlEmotionActivity {
    pub fn new(db: Pool<MySql>, day_offset: FixedOffset) -> Self {
        Self { db, day_offset }
    }
}

#[async_trait]
impl EmotionActivity for MySqlEmotionActivity {
    async fn has_recorded_today(&self, user_id: i64) -> StoreResult<bool> {
        const QUERY: &str = const_str::concat!(
            "SELECT COUNT(*) FROM ",
            TABLE_NAME,
            " WHERE user_id = ? AND created_at >= ?"
        );
        let day_start = start_of_day_utc(Utc::now(), self.day_offset);
        let count: i64 = sqlx::query_scalar(QUERY)
            .bind(user_id)
            .bind(day_start)
            .fetch_one(&self.db)
            .await?;
        Ok(count > 0)
    }
}
