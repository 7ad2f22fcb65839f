//! Persistence models for the task coordination state machine.
//!
//! Mirrors the `tasks` / `image_files` tables described by the coordinator's
//! data model: see the crate-level docs for the lifecycle diagram.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three states a [`Task`] can be in. There is no path directly from
/// `Pending` to `Deleted` — a task must pass through `Complete` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Complete,
    Deleted,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Complete => "complete",
            TaskStatus::Deleted => "deleted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "complete" => Some(TaskStatus::Complete),
            "deleted" => Some(TaskStatus::Deleted),
            _ => None,
        }
    }
}

/// Whether the [`Image`] backing a task still exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFileStatus {
    Uploaded,
    Deleted,
}

impl ImageFileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFileStatus::Uploaded => "uploaded",
            ImageFileStatus::Deleted => "deleted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "uploaded" => Some(ImageFileStatus::Uploaded),
            "deleted" => Some(ImageFileStatus::Deleted),
            _ => None,
        }
    }
}

/// The coordination record. See the crate docs for the invariants that must
/// hold across every state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub open_task_id: String,
    pub task_status: TaskStatus,
    pub image_file_status: ImageFileStatus,
    pub image_file_id: Option<i64>,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The opaque blob a [`Task`] points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    pub content: Vec<u8>,
    pub file_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A template used to filter task rows by equality over the fields that are
/// `Some`. Fields left `None` are not constrained. This mirrors the original
/// `Get(specifier, optionalSpecifiers)` contract — build one `TaskFilter` and,
/// for `Get`, an optional list of alternates that are OR-joined with it.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub id: Option<i64>,
    pub open_task_id: Option<String>,
    pub task_status: Option<TaskStatus>,
    pub image_file_status: Option<ImageFileStatus>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(id) = self.id {
            if task.id != id {
                return false;
            }
        }
        if let Some(ref open_task_id) = self.open_task_id {
            if &task.open_task_id != open_task_id {
                return false;
            }
        }
        if let Some(task_status) = self.task_status {
            if task.task_status != task_status {
                return false;
            }
        }
        if let Some(image_file_status) = self.image_file_status {
            if task.image_file_status != image_file_status {
                return false;
            }
        }
        true
    }
}

/// A row to insert via [`crate::TaskStore::create`].
#[derive(Debug, Clone)]
pub struct NewTask {
    pub open_task_id: String,
    pub task_status: TaskStatus,
    pub image_file_status: ImageFileStatus,
    pub image_file_id: Option<i64>,
}

/// A partial update keyed by `id`, applied to the fields that are `Some`.
/// Mirrors the original `Update(tx, newTask)` "non-zero fields" semantics.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub id: i64,
    pub task_status: Option<TaskStatus>,
    pub image_file_status: Option<ImageFileStatus>,
    pub caption: Option<String>,
}

/// A row to insert via [`crate::ImageStore::create`].
#[derive(Debug, Clone)]
pub struct NewImage {
    pub content: Vec<u8>,
    pub file_type: String,
}
