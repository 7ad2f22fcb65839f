//! Service-layer errors.
//!
//! Codes are reserved in `[10001, 19999]`. A [`ServiceError`] always wraps
//! the lower-layer error it was built from in its message, but the `code()`
//! a caller matches on is always one of this enum's own — the contract
//! never leaks the repository layer's numbering.

use ocr_store::StoreError;
use thiserror::Error;

use crate::imageutil::ImageUtilError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("no record found")]
    NoRecordFound,

    #[error("task is still pending")]
    TaskIsPending,

    #[error("task has already been deleted")]
    TaskIsDeleted,

    #[error("failed to create task: {0}")]
    CreateTaskFailed(String),

    #[error("failed to read task: {0}")]
    GetTaskFailed(String),

    #[error("failed to delete task: {0}")]
    DeleteTaskFailed(String),

    #[error("failed to store image: {0}")]
    StoreImageFailed(String),

    #[error("unsupported image type: {0}")]
    UnsupportedImageType(String),

    #[error("failed to save image: {0}")]
    SaveImageFailed(String),

    #[error("failed to apply OCR: {0}")]
    ApplyOcrFailed(String),

    #[error("system error: {0}")]
    SystemError(String),
}

impl ServiceError {
    /// Stable numeric code, reserved range `[10001, 19999]`.
    pub fn code(&self) -> u32 {
        match self {
            ServiceError::NoRecordFound => 10001,
            ServiceError::TaskIsPending => 10002,
            ServiceError::TaskIsDeleted => 10003,
            ServiceError::CreateTaskFailed(_) => 10004,
            ServiceError::GetTaskFailed(_) => 10005,
            ServiceError::DeleteTaskFailed(_) => 10006,
            ServiceError::StoreImageFailed(_) => 10007,
            ServiceError::UnsupportedImageType(_) => 10008,
            ServiceError::SaveImageFailed(_) => 10009,
            ServiceError::ApplyOcrFailed(_) => 10010,
            ServiceError::SystemError(_) => 19999,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NoRecordFound => ServiceError::NoRecordFound,
            other => ServiceError::SystemError(other.to_string()),
        }
    }
}

impl From<ImageUtilError> for ServiceError {
    fn from(err: ImageUtilError) -> Self {
        match err {
            ImageUtilError::UnsupportedType(t) => ServiceError::UnsupportedImageType(t),
            // Content `infer` can't recognize at all is just as unsupported
            // from the caller's point of view as content it recognizes and
            // rejects — both are the caller's malformed/unsupported upload,
            // not an OCR engine failure.
            ImageUtilError::SniffFailed => {
                ServiceError::UnsupportedImageType("undetectable content type".into())
            }
            other @ (ImageUtilError::DecodeFailed(_) | ImageUtilError::EncodeFailed(_)) => {
                ServiceError::ApplyOcrFailed(other.to_string())
            }
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
