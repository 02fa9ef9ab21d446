//! Storage error type shared by both user stores.

use thiserror::Error;

/// Errors raised by a [`UserStore`](super::UserStore) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("blocking storage task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Telegram ids fit in 52 bits, but both backends store signed 64-bit integers.
    #[error("user id {0} does not fit in a signed 64-bit column")]
    IdOutOfRange(u64),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Convert a Telegram user id into the signed form both backends persist.
pub fn storage_id(user_id: u64) -> StoreResult<i64> {
    i64::try_from(user_id).map_err(|_| StoreError::IdOutOfRange(user_id))
}
