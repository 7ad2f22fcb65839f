//! Claims one task whose image has not yet been hard-deleted but whose
//! task has already moved to `deleted` (via `GetTask`'s consume-on-read),
//! deletes the backing image, and marks `image_file_status` accordingly.

use ocr_core::ServiceError;
use ocr_store::{ImageFileStatus, ImageStore, TaskFilter, TaskPatch, TaskStatus, TaskStore};

/// Try to process one task. Returns `Ok(true)` if an image was deleted,
/// `Ok(false)` if there was nothing claimable right now.
pub async fn run_once<TS, IS>(tasks: &TS, images: &IS) -> Result<bool, ServiceError>
where
    TS: TaskStore,
    IS: ImageStore<Tx = TS::Tx>,
{
    let mut tx = tasks.begin().await?;

    let claimed = match tasks
        .try_claim(
            &mut tx,
            TaskFilter {
                task_status: Some(TaskStatus::Deleted),
                image_file_status: Some(ImageFileStatus::Uploaded),
                ..Default::default()
            },
        )
        .await
    {
        Ok(task) => task,
        Err(ocr_store::StoreError::NoRecordFound) => {
            tasks.rollback(tx).await?;
            return Ok(false);
        }
        Err(e) => {
            tasks.rollback(tx).await?;
            return Err(e.into());
        }
    };

    let result = delete_image(tasks, images, &mut tx, &claimed).await;
    match result {
        Ok(()) => {
            tasks.commit(tx).await?;
            Ok(true)
        }
        Err(e) => {
            tasks.rollback(tx).await?;
            Err(e)
        }
    }
}

async fn delete_image<TS, IS>(
    tasks: &TS,
    images: &IS,
    tx: &mut TS::Tx,
    claimed: &ocr_store::Task,
) -> Result<(), ServiceError>
where
    TS: TaskStore,
    IS: ImageStore<Tx = TS::Tx>,
{
    let image_id = claimed
        .image_file_id
        .ok_or_else(|| ServiceError::SystemError("claimed task has no image_file_id".into()))?;

    images
        .delete_by_id(tx, image_id)
        .await
        .map_err(|e| ServiceError::DeleteTaskFailed(e.to_string()))?;

    tasks
        .update(
            Some(tx),
            TaskPatch {
                id: claimed.id,
                image_file_status: Some(ImageFileStatus::Deleted),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| ServiceError::DeleteTaskFailed(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocr_store::{InMemoryImageStore, InMemoryTaskStore, NewImage, NewTask};

    #[tokio::test]
    async fn no_claimable_row_is_benign() {
        let tasks = InMemoryTaskStore::new();
        let images = InMemoryImageStore::new();
        let processed = run_once(&tasks, &images).await.unwrap();
        assert!(!processed);
    }

    #[tokio::test]
    async fn pending_tasks_are_not_claimed() {
        let tasks = InMemoryTaskStore::new();
        let images = InMemoryImageStore::new();
        tasks
            .create(NewTask {
                open_task_id: "t1".into(),
                task_status: TaskStatus::Pending,
                image_file_status: ImageFileStatus::Uploaded,
                image_file_id: None,
            })
            .await
            .unwrap();

        let processed = run_once(&tasks, &images).await.unwrap();
        assert!(!processed);
    }

    #[tokio::test]
    async fn deletes_image_and_marks_status() {
        let tasks = InMemoryTaskStore::new();
        let images = InMemoryImageStore::new();

        let image = images
            .create(NewImage {
                content: vec![1, 2, 3],
                file_type: "image/jpeg".into(),
            })
            .await
            .unwrap();
        let task = tasks
            .create(NewTask {
                open_task_id: "t2".into(),
                task_status: TaskStatus::Deleted,
                image_file_status: ImageFileStatus::Uploaded,
                image_file_id: Some(image.id),
            })
            .await
            .unwrap();

        let processed = run_once(&tasks, &images).await.unwrap();
        assert!(processed);

        let err = images.get_by_id(image.id).await.unwrap_err();
        assert!(matches!(err, ocr_store::StoreError::NoRecordFound));

        let after = tasks
            .get(
                TaskFilter {
                    id: Some(task.id),
                    ..Default::default()
                },
                &[],
            )
            .await
            .unwrap();
        assert_eq!(after.image_file_status, ImageFileStatus::Deleted);
        assert_eq!(after.task_status, TaskStatus::Deleted);
    }

    #[tokio::test]
    async fn already_deleted_image_is_not_reclaimed() {
        let tasks = InMemoryTaskStore::new();
        let images = InMemoryImageStore::new();
        tasks
            .create(NewTask {
                open_task_id: "t3".into(),
                task_status: TaskStatus::Deleted,
                image_file_status: ImageFileStatus::Deleted,
                image_file_id: None,
            })
            .await
            .unwrap();

        let processed = run_once(&tasks, &images).await.unwrap();
        assert!(!processed);
    }
}
