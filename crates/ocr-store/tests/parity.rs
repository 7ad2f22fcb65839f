//! Backend parity: one assertion body, run against every `TaskStore` +
//! `ImageStore` implementation this crate ships. Keeps the in-memory test
//! double and the Postgres backend honest against the same contract instead
//! of drifting apart as each grows its own bespoke test suite.

use ocr_store::{
    ImageFileStatus, ImageStore, NewImage, NewTask, TaskFilter, TaskPatch, TaskStatus, TaskStore,
};

/// Runs the shared scenario against any `(TaskStore, ImageStore<Tx = TaskStore::Tx>)`
/// pair: create an image + pending task, claim it under a transaction, commit
/// a completion patch, then read it back.
async fn create_claim_complete_round_trip<TS, IS>(tasks: &TS, images: &IS)
where
    TS: TaskStore,
    IS: ImageStore<Tx = TS::Tx>,
{
    let image = images
        .create(NewImage {
            content: vec![0xff, 0xd8, 0xff, 0xe0],
            file_type: "image/jpeg".into(),
        })
        .await
        .unwrap();

    let created = tasks
        .create(NewTask {
            open_task_id: format!("parity-{}", image.id),
            task_status: TaskStatus::Pending,
            image_file_status: ImageFileStatus::Uploaded,
            image_file_id: Some(image.id),
        })
        .await
        .unwrap();
    assert_eq!(created.task_status, TaskStatus::Pending);
    assert_eq!(created.caption, None);

    let mut tx = tasks.begin().await.unwrap();
    let claimed = tasks
        .try_claim(
            &mut tx,
            TaskFilter {
                task_status: Some(TaskStatus::Pending),
                image_file_status: Some(ImageFileStatus::Uploaded),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(claimed.id, created.id);

    tasks
        .update(
            Some(&mut tx),
            TaskPatch {
                id: created.id,
                task_status: Some(TaskStatus::Complete),
                caption: Some("parity check".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    tasks.commit(tx).await.unwrap();

    let after = tasks
        .get(
            TaskFilter {
                id: Some(created.id),
                ..Default::default()
            },
            &[],
        )
        .await
        .unwrap();
    assert_eq!(after.task_status, TaskStatus::Complete);
    assert_eq!(after.caption.as_deref(), Some("parity check"));
    assert_eq!(after.image_file_status, ImageFileStatus::Uploaded);
}

/// A second claimant against an already-claimed row sees `NoRecordFound`,
/// not a block — the `SKIP LOCKED` contract every backend must honor.
async fn second_claim_on_held_row_is_skipped<TS>(tasks: &TS)
where
    TS: TaskStore,
{
    let created = tasks
        .create(NewTask {
            open_task_id: format!("parity-skip-{}", uuid::Uuid::now_v7()),
            task_status: TaskStatus::Pending,
            image_file_status: ImageFileStatus::Uploaded,
            image_file_id: None,
        })
        .await
        .unwrap();

    let mut holder = tasks.begin().await.unwrap();
    tasks
        .try_claim(
            &mut holder,
            TaskFilter {
                id: Some(created.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let mut other = tasks.begin().await.unwrap();
    let err = tasks
        .try_claim(
            &mut other,
            TaskFilter {
                id: Some(created.id),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ocr_store::StoreError::NoRecordFound));

    tasks.rollback(other).await.unwrap();
    tasks.rollback(holder).await.unwrap();
}

#[cfg(feature = "in-memory")]
mod in_memory {
    use super::*;
    use ocr_store::{InMemoryImageStore, InMemoryTaskStore};

    #[tokio::test]
    async fn create_claim_complete_round_trip_in_memory() {
        let tasks = InMemoryTaskStore::new();
        let images = InMemoryImageStore::new();
        create_claim_complete_round_trip(&tasks, &images).await;
    }

    #[tokio::test]
    async fn second_claim_on_held_row_is_skipped_in_memory() {
        let tasks = InMemoryTaskStore::new();
        second_claim_on_held_row_is_skipped(&tasks).await;
    }
}

#[cfg(feature = "postgres")]
mod postgres {
    use super::*;
    use ocr_store::{run_migrations, PostgresImageStore, PostgresTaskStore};
    use sqlx::PgPool;

    async fn connect() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for this test");
        let pool = PgPool::connect(&url).await.expect("connect to postgres");
        run_migrations(&pool).await.expect("run migrations");
        pool
    }

    #[tokio::test]
    #[ignore]
    async fn create_claim_complete_round_trip_postgres() {
        let pool = connect().await;
        let tasks = PostgresTaskStore::new(pool.clone());
        let images = PostgresImageStore::new(pool);
        create_claim_complete_round_trip(&tasks, &images).await;
    }

    #[tokio::test]
    #[ignore]
    async fn second_claim_on_held_row_is_skipped_postgres() {
        let pool = connect().await;
        let tasks = PostgresTaskStore::new(pool);
        second_claim_on_held_row_is_skipped(&tasks).await;
    }
}
