//! Postgres-backed task and image stores.
//!
//! Row locking is literal SQL: `try_claim` issues
//! `SELECT ... FOR UPDATE SKIP LOCKED LIMIT 1`, then an `UPDATE ... WHERE id = $1`
//! inside the same transaction to hold the lock for the caller's subsequent
//! writes — the same pattern a `dequeue`-style queue uses to turn a locked
//! read into a claim without a separate "claimed_by" column.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::error::{StoreError, StoreResult};
use crate::models::{
    Image, ImageFileStatus, NewImage, NewTask, Task, TaskFilter, TaskPatch, TaskStatus,
};
use crate::traits::{ImageStore, TaskStore};

/// Creates the `tasks` and `image_files` tables if they do not already
/// exist. Mirrors the schema in the coordinator's persisted-schema section.
pub async fn run_migrations(pool: &PgPool) -> StoreResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS image_files (
            id BIGSERIAL PRIMARY KEY,
            content BYTEA NOT NULL,
            file_type TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id BIGSERIAL PRIMARY KEY,
            open_task_id TEXT NOT NULL UNIQUE,
            task_status TEXT NOT NULL,
            image_file_status TEXT NOT NULL,
            image_file_id BIGINT REFERENCES image_files(id),
            caption TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

fn row_to_task(row: &sqlx::postgres::PgRow) -> StoreResult<Task> {
    let task_status: String = row.try_get("task_status")?;
    let image_file_status: String = row.try_get("image_file_status")?;
    Ok(Task {
        id: row.try_get("id")?,
        open_task_id: row.try_get("open_task_id")?,
        task_status: TaskStatus::from_str(&task_status)
            .ok_or_else(|| StoreError::SystemError(format!("bad task_status: {task_status}")))?,
        image_file_status: ImageFileStatus::from_str(&image_file_status).ok_or_else(|| {
            StoreError::SystemError(format!("bad image_file_status: {image_file_status}"))
        })?,
        image_file_id: row.try_get("image_file_id")?,
        caption: row.try_get("caption")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_image(row: &sqlx::postgres::PgRow) -> StoreResult<Image> {
    Ok(Image {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        file_type: row.try_get("file_type")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Builds `WHERE` clause fragments (1-indexed bind params starting at
/// `start`) for a [`TaskFilter`], returning the SQL fragment and the bound
/// values in positional order.
struct FilterClause {
    sql: String,
    id: Option<i64>,
    open_task_id: Option<String>,
    task_status: Option<&'static str>,
    image_file_status: Option<&'static str>,
}

fn build_clause(filter: &TaskFilter, start: usize) -> FilterClause {
    let mut parts = Vec::new();
    let mut n = start;
    let mut id = None;
    let mut open_task_id = None;
    let mut task_status = None;
    let mut image_file_status = None;

    if let Some(v) = filter.id {
        parts.push(format!("id = ${n}"));
        id = Some(v);
        n += 1;
    }
    if let Some(ref v) = filter.open_task_id {
        parts.push(format!("open_task_id = ${n}"));
        open_task_id = Some(v.clone());
        n += 1;
    }
    if let Some(v) = filter.task_status {
        parts.push(format!("task_status = ${n}"));
        task_status = Some(v.as_str());
        n += 1;
    }
    if let Some(v) = filter.image_file_status {
        parts.push(format!("image_file_status = ${n}"));
        image_file_status = Some(v.as_str());
    }

    let sql = if parts.is_empty() {
        "TRUE".to_string()
    } else {
        parts.join(" AND ")
    };

    FilterClause {
        sql,
        id,
        open_task_id,
        task_status,
        image_file_status,
    }
}

/// Postgres-backed repository over the `tasks` table.
#[derive(Clone)]
pub struct PostgresTaskStore {
    pool: PgPool,
}

impl PostgresTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PostgresTaskStore {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> StoreResult<Self::Tx> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, tx: Self::Tx) -> StoreResult<()> {
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> StoreResult<()> {
        tx.rollback().await?;
        Ok(())
    }

    async fn get(&self, filter: TaskFilter, alternates: &[TaskFilter]) -> StoreResult<Task> {
        let mut clauses = Vec::with_capacity(1 + alternates.len());
        clauses.push(build_clause(&filter, 1));
        let mut next = clauses[0].id.is_some() as usize
            + clauses[0].open_task_id.is_some() as usize
            + clauses[0].task_status.is_some() as usize
            + clauses[0].image_file_status.is_some() as usize
            + 1;
        for alt in alternates {
            let clause = build_clause(alt, next);
            next += clause.id.is_some() as usize
                + clause.open_task_id.is_some() as usize
                + clause.task_status.is_some() as usize
                + clause.image_file_status.is_some() as usize;
            clauses.push(clause);
        }

        let where_sql = clauses
            .iter()
            .map(|c| format!("({})", c.sql))
            .collect::<Vec<_>>()
            .join(" OR ");
        let sql = format!(
            "SELECT id, open_task_id, task_status, image_file_status, image_file_id, caption, \
             created_at, updated_at FROM tasks WHERE {where_sql} LIMIT 1"
        );

        let mut query = sqlx::query(&sql);
        for clause in &clauses {
            if let Some(v) = clause.id {
                query = query.bind(v);
            }
            if let Some(ref v) = clause.open_task_id {
                query = query.bind(v.clone());
            }
            if let Some(v) = clause.task_status {
                query = query.bind(v);
            }
            if let Some(v) = clause.image_file_status {
                query = query.bind(v);
            }
        }

        let row = query
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NoRecordFound)?;
        row_to_task(&row)
    }

    async fn try_claim(&self, tx: &mut Self::Tx, filter: TaskFilter) -> StoreResult<Task> {
        let clause = build_clause(&filter, 1);
        let select_sql = format!(
            "SELECT id FROM tasks WHERE {} ORDER BY id FOR UPDATE SKIP LOCKED LIMIT 1",
            clause.sql
        );

        let mut query = sqlx::query(&select_sql);
        if let Some(v) = clause.id {
            query = query.bind(v);
        }
        if let Some(ref v) = clause.open_task_id {
            query = query.bind(v.clone());
        }
        if let Some(v) = clause.task_status {
            query = query.bind(v);
        }
        if let Some(v) = clause.image_file_status {
            query = query.bind(v);
        }

        let id_row = query
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(StoreError::NoRecordFound)?;
        let id: i64 = id_row.try_get("id")?;

        let row = sqlx::query(
            "SELECT id, open_task_id, task_status, image_file_status, image_file_id, caption, \
             created_at, updated_at FROM tasks WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&mut **tx)
        .await?;
        row_to_task(&row)
    }

    async fn create(&self, row: NewTask) -> StoreResult<Task> {
        let r = sqlx::query(
            "INSERT INTO tasks (open_task_id, task_status, image_file_status, image_file_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, open_task_id, task_status, image_file_status, image_file_id, caption, \
             created_at, updated_at",
        )
        .bind(row.open_task_id)
        .bind(row.task_status.as_str())
        .bind(row.image_file_status.as_str())
        .bind(row.image_file_id)
        .fetch_one(&self.pool)
        .await?;
        row_to_task(&r)
    }

    async fn update(&self, tx: Option<&mut Self::Tx>, patch: TaskPatch) -> StoreResult<Task> {
        let sql = "UPDATE tasks SET \
             task_status = COALESCE($2, task_status), \
             image_file_status = COALESCE($3, image_file_status), \
             caption = COALESCE($4, caption), \
             updated_at = now() \
             WHERE id = $1 \
             RETURNING id, open_task_id, task_status, image_file_status, image_file_id, caption, \
             created_at, updated_at";

        let query = sqlx::query(sql)
            .bind(patch.id)
            .bind(patch.task_status.map(|s| s.as_str()))
            .bind(patch.image_file_status.map(|s| s.as_str()))
            .bind(patch.caption);

        let row = match tx {
            Some(tx) => query.fetch_one(&mut **tx).await?,
            None => query.fetch_one(&self.pool).await?,
        };
        row_to_task(&row)
    }
}

/// Postgres-backed repository over the `image_files` table.
#[derive(Clone)]
pub struct PostgresImageStore {
    pool: PgPool,
}

impl PostgresImageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImageStore for PostgresImageStore {
    type Tx = Transaction<'static, Postgres>;

    async fn get_by_id(&self, id: i64) -> StoreResult<Image> {
        let row = sqlx::query(
            "SELECT id, content, file_type, created_at, updated_at FROM image_files WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NoRecordFound)?;
        row_to_image(&row)
    }

    async fn create(&self, row: NewImage) -> StoreResult<Image> {
        let r = sqlx::query(
            "INSERT INTO image_files (content, file_type) VALUES ($1, $2) \
             RETURNING id, content, file_type, created_at, updated_at",
        )
        .bind(row.content)
        .bind(row.file_type)
        .fetch_one(&self.pool)
        .await?;
        row_to_image(&r)
    }

    async fn delete_by_id(&self, tx: &mut Self::Tx, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM image_files WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NoRecordFound);
        }
        Ok(())
    }
}
