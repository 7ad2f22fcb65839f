//! Wake-up signalling between HTTP handlers/workers and the worker pools.
//!
//! A [`Notifier`] carries no payload — workers always rescan the store for
//! claimable rows rather than trusting the notification to name one — so a
//! dropped notification (the channel is full) only costs a missed wake-up,
//! never a missed task: the next poll, or the next unrelated notification,
//! will pick the row up. `notify()` is therefore non-blocking by design:
//! callers must never wait on a full notification channel just to nudge a
//! pool that is already busy.

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{channel, Receiver, Sender};

/// One end of a bounded wake-up channel. Cloning a `Notifier` clones the
/// sender; all clones wake the same pool.
#[derive(Clone)]
pub struct Notifier {
    sender: Sender<()>,
}

impl Notifier {
    /// Create a linked `(Notifier, Receiver)` pair with the given channel
    /// capacity.
    pub fn channel(capacity: usize) -> (Self, Receiver<()>) {
        let (sender, receiver) = channel(capacity);
        (Self { sender }, receiver)
    }

    /// Wake a worker. Drops the notification silently if the channel is
    /// already full — a worker is already going to rescan soon regardless.
    pub fn notify(&self) {
        match self.sender.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Closed(())) => {
                tracing::warn!("notify() called after all workers for this pool have shut down");
            }
        }
    }
}
