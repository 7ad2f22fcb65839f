//! Claims one pending task, applies OCR to its image, and marks it
//! `complete`. Any failure after the claim rolls the transaction back,
//! leaving the task `pending` for a later attempt — OCR delivery is
//! at-least-once, never best-effort-dropped.

use ocr_core::{OcrAdapter, ServiceError};
use ocr_store::{ImageFileStatus, ImageStore, TaskFilter, TaskPatch, TaskStatus, TaskStore};

/// Try to process one task. Returns `Ok(true)` if a task was claimed and
/// completed, `Ok(false)` if there was nothing claimable right now.
pub async fn run_once<TS, IS>(
    tasks: &TS,
    images: &IS,
    ocr: &OcrAdapter,
) -> Result<bool, ServiceError>
where
    TS: TaskStore,
    IS: ImageStore<Tx = TS::Tx>,
{
    let mut tx = tasks.begin().await?;

    let claimed = match tasks
        .try_claim(
            &mut tx,
            TaskFilter {
                task_status: Some(TaskStatus::Pending),
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

    let result = process_claimed(tasks, images, ocr, &mut tx, &claimed).await;
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

async fn process_claimed<TS, IS>(
    tasks: &TS,
    images: &IS,
    ocr: &OcrAdapter,
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

    let image = images
        .get_by_id(image_id)
        .await
        .map_err(|e| ServiceError::GetTaskFailed(e.to_string()))?;

    let caption = ocr.apply_ocr(&image.content).await?;

    tasks
        .update(
            Some(tx),
            TaskPatch {
                id: claimed.id,
                task_status: Some(TaskStatus::Complete),
                caption: Some(caption),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| ServiceError::CreateTaskFailed(e.to_string()))?;

    Ok(())
}
