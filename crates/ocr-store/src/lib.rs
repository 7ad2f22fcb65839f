//! Task and image-file repositories.
//!
//! # Data model
//!
//! A [`models::Task`] moves through exactly three states:
//!
//! ```text
//! pending --(OCR worker succeeds)--> complete --(deleter worker)--> deleted
//! ```
//!
//! There is no direct `pending -> deleted` edge; a task must be read as
//! `complete` at least once (which is also the point at which `GetTask`
//! consumes it, see `ocr-core`) before the deleter worker will pick it up.
//! `image_file_status` tracks the backing [`models::Image`] independently:
//! `uploaded` until the deleter worker hard-deletes the row, then `deleted`.
//!
//! This crate owns the two repository traits ([`traits::TaskStore`],
//! [`traits::ImageStore`]) and two implementations of each: an in-memory test
//! double (feature `in-memory`, enabled by default) and a Postgres-backed
//! store (feature `postgres`) using row-level locking (`FOR UPDATE` /
//! `FOR UPDATE SKIP LOCKED`) to let many workers claim disjoint rows safely.

pub mod error;
pub mod models;
pub mod traits;

#[cfg(feature = "in-memory")]
pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use error::{StoreError, StoreResult};
pub use models::{Image, ImageFileStatus, NewImage, NewTask, Task, TaskFilter, TaskPatch, TaskStatus};
pub use traits::{ImageStore, TaskStore};

#[cfg(feature = "in-memory")]
pub use memory::{InMemoryImageStore, InMemoryTaskStore, MemTx};

#[cfg(feature = "postgres")]
pub use postgres::{run_migrations, PostgresImageStore, PostgresTaskStore};
