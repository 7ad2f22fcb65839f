//! Worker pools that drive tasks forward through their lifecycle:
//!
//! - the OCR worker claims `pending`/`uploaded` tasks and completes them
//! - the deleter worker claims `deleted`/`uploaded` tasks and hard-deletes
//!   their image
//!
//! Both are plain async functions ([`ocr_worker::run_once`],
//! [`deleter_worker::run_once`]) generic over the repository traits; a
//! [`pool::WorkerPool`] is just N copies of "loop: wait for a wake-up from
//! a [`notifier::Notifier`], call the function once".

pub mod deleter_worker;
pub mod notifier;
pub mod ocr_worker;
pub mod pool;

pub use notifier::Notifier;
pub use pool::WorkerPool;

/// Pool sizing, kept as named constants rather than scattered literals so a
/// future config surface (see `ocr-server::config`) has one place to read
/// defaults from.
pub const DEFAULT_POOL_SIZE: usize = 10;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;
