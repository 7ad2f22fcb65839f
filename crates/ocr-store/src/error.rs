//! Repository-layer errors.
//!
//! Codes are reserved in `[1, 9999]`, per the coordinator's error taxonomy: the
//! numeric code is the stable contract between layers, the message is
//! diagnostic only.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no record found")]
    NoRecordFound,

    #[error("a transaction handle is required for this operation")]
    NoTransaction,

    #[error("backend error: {0}")]
    SystemError(String),
}

impl StoreError {
    /// Stable numeric code, reserved range `[1, 9999]`.
    pub fn code(&self) -> u32 {
        match self {
            StoreError::NoRecordFound => 2,
            StoreError::NoTransaction => 3,
            StoreError::SystemError(_) => 1,
        }
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NoRecordFound,
            other => StoreError::SystemError(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
