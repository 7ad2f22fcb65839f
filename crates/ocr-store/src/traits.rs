//! Repository traits for tasks and image files.
//!
//! Both traits are parameterized by an associated `Tx` transaction handle.
//! `TaskStore` owns transaction lifecycle (`begin`/`commit`/`rollback`);
//! `ImageStore::delete_by_id` takes a transaction borrowed from the same
//! backend so a worker can hard-delete an image and update its task's row in
//! one commit. Bind `ImageStore::Tx = TaskStore::Tx` at the call site (both
//! concrete backends in this crate use the same transaction type for both
//! stores) to run them together.

use crate::error::StoreResult;
use crate::models::{Image, NewImage, NewTask, Task, TaskFilter, TaskPatch};
use async_trait::async_trait;

/// Repository over the `tasks` table.
///
/// `get` is the untransacted, unlocked lookup used by the task service
/// (neither `CreateTask` nor `GetTask` hold a transaction across their
/// store calls — see the crate's `GetTask` docs for why the consume-on-read
/// transition is a deliberate blind update). `try_claim` is the locking
/// primitive workers use to pull one row off the pending/deleted queue.
#[async_trait]
pub trait TaskStore: Send + Sync {
    type Tx: Send;

    async fn begin(&self) -> StoreResult<Self::Tx>;
    async fn commit(&self, tx: Self::Tx) -> StoreResult<()>;
    async fn rollback(&self, tx: Self::Tx) -> StoreResult<()>;

    /// Return exactly one row matching `filter`, or any of `alternates`
    /// (OR-joined). Fails with [`crate::StoreError::NoRecordFound`] if none
    /// match.
    ///
    /// Deliberately takes no transaction handle, unlike the coordinator's
    /// `Get(filter, alternates?)`, which accepts one and acquires `FOR
    /// UPDATE` when given it. No caller in this workspace ever needs a
    /// locked read through `get` — the task service reads untransacted, and
    /// workers lock via `try_claim` instead — so that variant is omitted
    /// here rather than carried as dead surface. See DESIGN.md.
    async fn get(&self, filter: TaskFilter, alternates: &[TaskFilter]) -> StoreResult<Task>;

    /// Acquire `FOR UPDATE SKIP LOCKED` on the first row matching `filter`
    /// inside `tx`. Fails with [`crate::StoreError::NoRecordFound`] if every
    /// matching row is already locked by a concurrent claimant, or none
    /// match at all — both cases are benign to the caller.
    async fn try_claim(&self, tx: &mut Self::Tx, filter: TaskFilter) -> StoreResult<Task>;

    /// Insert a new task row, returning it with its assigned `id`.
    async fn create(&self, row: NewTask) -> StoreResult<Task>;

    /// Apply a partial update keyed by `patch.id`. When `tx` is given the
    /// update happens inside that transaction (extending a held claim);
    /// when `tx` is `None` this is a standalone, unlocked update — the
    /// "blind update" the consume-on-read transition deliberately uses.
    async fn update(&self, tx: Option<&mut Self::Tx>, patch: TaskPatch) -> StoreResult<Task>;
}

/// Repository over the `image_files` table. Delete is always a hard delete —
/// there is no soft-delete flag; `Task::image_file_status` carries that
/// signal instead.
#[async_trait]
pub trait ImageStore: Send + Sync {
    type Tx: Send;

    async fn get_by_id(&self, id: i64) -> StoreResult<Image>;
    async fn create(&self, row: NewImage) -> StoreResult<Image>;
    async fn delete_by_id(&self, tx: &mut Self::Tx, id: i64) -> StoreResult<()>;
}
