//! The task service: the only place outside the workers that touches the
//! task/image repositories.
//!
//! `get_task`'s `complete -> deleted` transition is a deliberate blind
//! update, not run inside a transaction with the read that preceded it.
//! Two overlapping `GetTask` calls against the same already-complete task
//! can both observe `complete` and both issue the same update — harmless,
//! since the update is idempotent (`deleted` twice is still `deleted`) and
//! the caption returned is identical either way. Making this transactional
//! would mean holding a row lock across a second round-trip purely to avoid
//! a race with no observable effect; the system tolerates it instead.
//!
//! Only the `complete` branch of `get_task` ever hands back a caption. A
//! task still `pending`, or already consumed (`deleted`), surfaces as
//! [`ServiceError::TaskIsPending`] / [`ServiceError::TaskIsDeleted`] —
//! informational outcomes the HTTP layer renders identically as a literal
//! `"text":"null"`, never the caption a prior read already returned.

use std::sync::Arc;

use async_trait::async_trait;
use ocr_store::{
    Image, ImageStore, NewImage, NewTask, Task, TaskFilter, TaskPatch, TaskStatus, TaskStore,
};
use ocr_store::ImageFileStatus;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::imageutil::sniff_mime;

/// Result of a successful [`TaskService::get_task`] — only returned for a
/// task observed as `complete`. Pending and already-deleted tasks surface as
/// [`ServiceError::TaskIsPending`] / [`ServiceError::TaskIsDeleted`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskView {
    pub open_task_id: String,
    pub caption: String,
}

/// Generic over both repository traits so the composition root can
/// monomorphize over whichever backend pair it wires up (in-memory for
/// tests, Postgres in production).
pub struct TaskService<TS, IS>
where
    TS: TaskStore,
    IS: ImageStore<Tx = TS::Tx>,
{
    tasks: TS,
    images: IS,
}

impl<TS, IS> TaskService<TS, IS>
where
    TS: TaskStore,
    IS: ImageStore<Tx = TS::Tx>,
{
    pub fn new(tasks: TS, images: IS) -> Self {
        Self { tasks, images }
    }

    /// Save the uploaded bytes as an [`Image`] and a new `pending` [`Task`]
    /// pointing at it. Returns the freshly minted `open_task_id` the caller
    /// polls with.
    pub async fn create_task(&self, content: Vec<u8>) -> ServiceResult<String> {
        let image = self
            .save_image(content)
            .await
            .map_err(|e| ServiceError::StoreImageFailed(e.to_string()))?;

        let open_task_id = Uuid::now_v7().to_string();
        let task = self
            .tasks
            .create(NewTask {
                open_task_id: open_task_id.clone(),
                task_status: TaskStatus::Pending,
                image_file_status: ImageFileStatus::Uploaded,
                image_file_id: Some(image.id),
            })
            .await
            .map_err(|e| ServiceError::CreateTaskFailed(e.to_string()))?;

        Ok(task.open_task_id)
    }

    async fn save_image(&self, content: Vec<u8>) -> ServiceResult<Image> {
        let mime = sniff_mime(&content)?;
        self.images
            .create(NewImage {
                content,
                file_type: mime.to_string(),
            })
            .await
            .map_err(ServiceError::from)
    }

    /// Look a task up by its `open_task_id`.
    ///
    /// - `pending`: surfaces as [`ServiceError::TaskIsPending`] — the HTTP
    ///   layer renders this identically to `deleted`, as `"text":"null"`.
    /// - `complete`: consumes the task (blind-updates it to `deleted`,
    ///   see module docs) and returns the caption that was computed. This
    ///   is the one branch that ever discloses a caption.
    /// - `deleted`: the task was already consumed by a prior call; surfaces
    ///   as [`ServiceError::TaskIsDeleted`] — the caption is not returned
    ///   again, so a second poll is indistinguishable from an id that is
    ///   still pending.
    pub async fn get_task(&self, open_task_id: &str) -> ServiceResult<TaskView> {
        let task = self
            .tasks
            .get(
                TaskFilter {
                    open_task_id: Some(open_task_id.to_string()),
                    ..Default::default()
                },
                &[],
            )
            .await
            .map_err(|e| match e {
                ocr_store::StoreError::NoRecordFound => ServiceError::NoRecordFound,
                other => ServiceError::GetTaskFailed(other.to_string()),
            })?;

        match task.task_status {
            TaskStatus::Pending => Err(ServiceError::TaskIsPending),
            TaskStatus::Complete => {
                let updated = self
                    .tasks
                    .update(
                        None,
                        TaskPatch {
                            id: task.id,
                            task_status: Some(TaskStatus::Deleted),
                            ..Default::default()
                        },
                    )
                    .await
                    .map_err(|e| ServiceError::GetTaskFailed(e.to_string()))?;
                Ok(TaskView {
                    open_task_id: updated.open_task_id,
                    caption: updated.caption.ok_or_else(|| {
                        ServiceError::GetTaskFailed(
                            "complete task has no caption (invariant 2 violated)".into(),
                        )
                    })?,
                })
            }
            TaskStatus::Deleted => Err(ServiceError::TaskIsDeleted),
        }
    }
}

/// Narrower, object-safe surface used at the HTTP boundary so handlers stay
/// decoupled from the concrete store backend — mirrors exposing a boxed
/// trait object at a service boundary while keeping the generic struct
/// above for composition-root wiring.
#[async_trait]
pub trait TaskServiceApi: Send + Sync {
    async fn create_task(&self, content: Vec<u8>) -> ServiceResult<String>;
    async fn get_task(&self, open_task_id: &str) -> ServiceResult<TaskView>;
}

#[async_trait]
impl<TS, IS> TaskServiceApi for TaskService<TS, IS>
where
    TS: TaskStore + Send + Sync,
    IS: ImageStore<Tx = TS::Tx> + Send + Sync,
    TS::Tx: Send,
{
    async fn create_task(&self, content: Vec<u8>) -> ServiceResult<String> {
        TaskService::create_task(self, content).await
    }

    async fn get_task(&self, open_task_id: &str) -> ServiceResult<TaskView> {
        TaskService::get_task(self, open_task_id).await
    }
}

/// Convenience alias used by `ocr-http`, which only ever needs a
/// type-erased handle to the service.
pub type SharedTaskService = Arc<dyn TaskServiceApi>;

#[cfg(test)]
mod tests {
    use super::*;
    use ocr_store::{InMemoryImageStore, InMemoryTaskStore};

    const PNG_1X1: &[u8] = &[
        0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
        0x77, 0x53, 0xde, 0x00, 0x00, 0x00, 0x0c, 0x49, 0x44, 0x41, 0x54, 0x08, 0xd7, 0x63, 0xf8,
        0xcf, 0xc0, 0x00, 0x00, 0x03, 0x01, 0x01, 0x00, 0x18, 0xdd, 0x8d, 0xb0, 0x00, 0x00, 0x00,
        0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
    ];

    fn new_service() -> TaskService<InMemoryTaskStore, InMemoryImageStore> {
        TaskService::new(InMemoryTaskStore::new(), InMemoryImageStore::new())
    }

    #[tokio::test]
    async fn create_task_rejects_unsupported_bytes() {
        let service = new_service();
        let err = service.create_task(b"not an image".to_vec()).await.unwrap_err();
        assert!(matches!(err, ServiceError::UnsupportedImageType(_)));
    }

    #[tokio::test]
    async fn create_then_get_pending_task_reports_pending() {
        let service = new_service();
        let open_task_id = service.create_task(PNG_1X1.to_vec()).await.unwrap();

        let err = service.get_task(&open_task_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::TaskIsPending));
    }

    #[tokio::test]
    async fn get_task_unknown_id_is_no_record_found() {
        let service = new_service();
        let err = service.get_task("does-not-exist").await.unwrap_err();
        assert!(matches!(err, ServiceError::NoRecordFound));
    }

    #[tokio::test]
    async fn get_task_consumes_complete_task_and_is_idempotent() {
        let service = new_service();
        let open_task_id = service.create_task(PNG_1X1.to_vec()).await.unwrap();

        // Simulate what the OCR worker does: claim, set caption, complete.
        let task = service
            .tasks
            .get(
                TaskFilter {
                    open_task_id: Some(open_task_id.clone()),
                    ..Default::default()
                },
                &[],
            )
            .await
            .unwrap();
        service
            .tasks
            .update(
                None,
                TaskPatch {
                    id: task.id,
                    task_status: Some(TaskStatus::Complete),
                    caption: Some("extracted text".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let first = service.get_task(&open_task_id).await.unwrap();
        assert_eq!(first.caption, "extracted text");

        // Consume-on-read should have moved the task to `deleted`; a second
        // read does not disclose the caption again.
        let second = service.get_task(&open_task_id).await.unwrap_err();
        assert!(matches!(second, ServiceError::TaskIsDeleted));
    }
}
