//! Business logic layered on top of `ocr-store`'s repositories: creating and
//! reading tasks, and applying OCR to uploaded images.

pub mod error;
pub mod imageutil;
pub mod ocr_adapter;
pub mod task_service;

pub use error::{ServiceError, ServiceResult};
pub use imageutil::ImageUtilError;
pub use ocr_adapter::OcrAdapter;
pub use task_service::{SharedTaskService, TaskService, TaskServiceApi, TaskView};
