//! A fixed-size pool of tasks draining one notification channel.
//!
//! Each worker loop is identical: wait for a wake-up, run the supplied
//! closure once, repeat, until the channel closes. The channel closing
//! (every [`crate::notifier::Notifier`] clone dropped) is the pool's only
//! shutdown signal — there is no separate cancellation path, matching the
//! workers' "fresh, non-cancellable background context" treatment.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc::Receiver;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// A running pool of `n` workers. Dropping this does not stop the workers —
/// hold onto the `JoinHandle`s (or just let them run for the process
/// lifetime, as `ocr-server` does) and close the paired `Notifier` to shut
/// them down.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` tasks, each looping on `receiver` and invoking `f` once
    /// per wake-up. `f` is cloned per worker (it is typically a cheap
    /// `Arc`-wrapped closure or a `Fn` capturing `Arc` handles to the
    /// stores).
    pub fn spawn<F, Fut>(size: usize, receiver: Receiver<()>, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let receiver = Arc::new(Mutex::new(receiver));
        let f = Arc::new(f);
        let mut handles = Vec::with_capacity(size);
        for worker_id in 0..size {
            let receiver = receiver.clone();
            let f = f.clone();
            handles.push(tokio::spawn(async move {
                loop {
                    let got = receiver.lock().await.recv().await;
                    if got.is_none() {
                        tracing::debug!(worker_id, "worker pool channel closed, shutting down");
                        break;
                    }
                    f().await;
                }
            }));
        }
        Self { handles }
    }

    /// Number of workers in this pool.
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Abort every worker task immediately.
    pub fn shutdown(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc::channel;

    #[tokio::test]
    async fn every_notification_is_processed_by_some_worker() {
        let (tx, rx) = channel(10);
        let counter = Arc::new(AtomicUsize::new(0));
        let pool_counter = counter.clone();
        let pool = WorkerPool::spawn(3, rx, move || {
            let counter = pool_counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        assert_eq!(pool.size(), 3);

        for _ in 0..5 {
            tx.send(()).await.unwrap();
        }
        // Give the workers a moment to drain the channel.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 5);

        pool.shutdown();
    }
}
