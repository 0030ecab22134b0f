pub mod emotion_records;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod notification_blocks;
pub mod relationships;
pub mod users;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The pair already has a pending or accepted relationship.
    #[error("a non-terminal relationship already exists for this pair")]
    PairConflict,
    /// The transaction lost a lock conflict and can be replayed from the start.
    #[error("transaction aborted by a concurrent writer: {0}")]
    Retryable(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("stored row is malformed: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Database(sqlx::Error),
}

// InnoDB reports both deadlocks and serialization failures as SQLSTATE 40001
const SERIALIZATION_FAILURE: &str = "40001";

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        let retryable = matches!(
            &e,
            sqlx::Error::Database(db_error)
                if db_error.code().as_deref() == Some(SERIALIZATION_FAILURE)
        );
        if retryable {
            StoreError::Retryable(Box::new(e))
        } else {
            StoreError::Database(e)
        }
    }
}

impl From<crate::models::relationships::UnknownStatus> for StoreError {
    fn from(e: crate::models::relationships::UnknownStatus) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}
