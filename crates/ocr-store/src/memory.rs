//! In-memory task and image stores.
//!
//! A test double: no external database is required. `TryClaim` emulates
//! `FOR UPDATE SKIP LOCKED` with `Mutex::try_lock_owned` — a row currently
//! held by a concurrent claimant is skipped rather than waited on, which is
//! exactly what `SKIP LOCKED` buys the Postgres backend. Writes made through
//! [`TaskStore::update`] while a claim is held are staged in the transaction
//! handle and only applied to the row at [`TaskStore::commit`], so a
//! `rollback` genuinely discards them — matching the real backend's
//! transactional semantics, not just its locking.
//!
//! Image deletion is not staged: [`ImageStore::delete_by_id`] hard-deletes
//! immediately. Nothing in this system concurrently contends an image row
//! (each is reachable from exactly one task), so the only property this
//! backend needs to preserve is "deleted images are gone"; crash-between-
//! delete-and-commit recovery is a Postgres-only guarantee here. See
//! DESIGN.md.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::error::{StoreError, StoreResult};
use crate::models::{Image, NewImage, NewTask, Task, TaskFilter, TaskPatch};
use crate::traits::{ImageStore, TaskStore};

type TaskRow = Arc<Mutex<Task>>;

/// A held claim plus any patch staged for it, released/applied on
/// commit/rollback.
pub struct MemTx {
    claimed: Option<(i64, OwnedMutexGuard<Task>)>,
    pending_patch: Option<TaskPatch>,
}

fn apply_patch(task: &mut Task, patch: &TaskPatch) {
    if let Some(status) = patch.task_status {
        task.task_status = status;
    }
    if let Some(status) = patch.image_file_status {
        task.image_file_status = status;
    }
    if patch.caption.is_some() {
        task.caption = patch.caption.clone();
    }
    task.updated_at = Utc::now();
}

/// In-memory backend for the `tasks` table.
#[derive(Clone)]
pub struct InMemoryTaskStore {
    rows: Arc<RwLock<HashMap<i64, TaskRow>>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    /// Snapshot every row — used by tests that need to scan the table.
    pub async fn snapshot(&self) -> Vec<Task> {
        let rows = self.rows.read().await;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows.values() {
            out.push(row.lock().await.clone());
        }
        out
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    type Tx = MemTx;

    async fn begin(&self) -> StoreResult<Self::Tx> {
        Ok(MemTx {
            claimed: None,
            pending_patch: None,
        })
    }

    async fn commit(&self, mut tx: Self::Tx) -> StoreResult<()> {
        if let (Some((_, guard)), Some(patch)) = (tx.claimed.as_mut(), tx.pending_patch.take()) {
            apply_patch(guard, &patch);
        }
        Ok(())
    }

    async fn rollback(&self, _tx: Self::Tx) -> StoreResult<()> {
        // Dropping `_tx` releases the held guard without applying
        // `pending_patch` — that is the rollback.
        Ok(())
    }

    async fn get(&self, filter: TaskFilter, alternates: &[TaskFilter]) -> StoreResult<Task> {
        let rows = self.rows.read().await;
        for row in rows.values() {
            let task = row.lock().await;
            if filter.matches(&task) || alternates.iter().any(|alt| alt.matches(&task)) {
                return Ok(task.clone());
            }
        }
        Err(StoreError::NoRecordFound)
    }

    async fn try_claim(&self, tx: &mut Self::Tx, filter: TaskFilter) -> StoreResult<Task> {
        let candidates: Vec<(i64, TaskRow)> = {
            let rows = self.rows.read().await;
            rows.iter().map(|(id, row)| (*id, row.clone())).collect()
        };

        for (id, row) in candidates {
            match row.try_lock_owned() {
                Ok(guard) => {
                    if filter.matches(&guard) {
                        let task = guard.clone();
                        tx.claimed = Some((id, guard));
                        return Ok(task);
                    }
                    // Doesn't match; drop the guard and keep scanning.
                }
                Err(_) => continue, // Locked by another claimant: skip, per SKIP LOCKED.
            }
        }
        Err(StoreError::NoRecordFound)
    }

    async fn create(&self, row: NewTask) -> StoreResult<Task> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let task = Task {
            id,
            open_task_id: row.open_task_id,
            task_status: row.task_status,
            image_file_status: row.image_file_status,
            image_file_id: row.image_file_id,
            caption: None,
            created_at: now,
            updated_at: now,
        };
        self.rows
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(task.clone())));
        Ok(task)
    }

    async fn update(&self, tx: Option<&mut Self::Tx>, patch: TaskPatch) -> StoreResult<Task> {
        match tx {
            Some(tx) => match tx.claimed.as_mut() {
                Some((claimed_id, guard)) if *claimed_id == patch.id => {
                    let mut projected = (**guard).clone();
                    apply_patch(&mut projected, &patch);
                    tx.pending_patch = Some(patch);
                    Ok(projected)
                }
                _ => Err(StoreError::SystemError(
                    "update called with a transaction that has not claimed this task".into(),
                )),
            },
            None => {
                let row = {
                    let rows = self.rows.read().await;
                    rows.get(&patch.id)
                        .cloned()
                        .ok_or(StoreError::NoRecordFound)?
                };
                let mut guard = row.lock().await;
                apply_patch(&mut guard, &patch);
                Ok(guard.clone())
            }
        }
    }
}

/// In-memory backend for the `image_files` table.
#[derive(Clone)]
pub struct InMemoryImageStore {
    rows: Arc<RwLock<HashMap<i64, Image>>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryImageStore {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for InMemoryImageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    type Tx = MemTx;

    async fn get_by_id(&self, id: i64) -> StoreResult<Image> {
        self.rows
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NoRecordFound)
    }

    async fn create(&self, row: NewImage) -> StoreResult<Image> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let image = Image {
            id,
            content: row.content,
            file_type: row.file_type,
            created_at: now,
            updated_at: now,
        };
        self.rows.write().await.insert(id, image.clone());
        Ok(image)
    }

    async fn delete_by_id(&self, _tx: &mut Self::Tx, id: i64) -> StoreResult<()> {
        self.rows
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NoRecordFound)
    }
}
