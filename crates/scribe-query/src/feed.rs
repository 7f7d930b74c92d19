//! Subscriber-facing view of the engine's result list.

use tokio::sync::{mpsc, watch};

use scribe_core::Note;

use crate::engine::Command;

/// A live, multicast view of the engine's derived note list.
///
/// All feeds of one engine observe the same emissions; the derivation work
/// is shared, not duplicated per feed. Dropping a feed detaches it — once
/// the last feed is gone the engine parks its store subscription after a
/// grace period, keeping the cached snapshot available for the next
/// subscriber.
#[derive(Debug)]
pub struct NoteFeed {
    rx: watch::Receiver<Vec<Note>>,
    primed: bool,
    _guard: FeedGuard,
}

impl NoteFeed {
    pub(crate) fn new(
        rx: watch::Receiver<Vec<Note>>,
        cmd_tx: mpsc::UnboundedSender<Command>,
    ) -> Self {
        Self {
            rx,
            primed: false,
            _guard: FeedGuard { cmd_tx },
        }
    }

    /// The cached snapshot, served synchronously. During recomputation this
    /// is the stale-but-available previous value.
    pub fn snapshot(&self) -> Vec<Note> {
        self.rx.borrow().clone()
    }

    /// The next emission. The first call yields the cached snapshot
    /// immediately; subsequent calls wait for a fresh publication. Returns
    /// `None` once the engine has stopped.
    pub async fn next(&mut self) -> Option<Vec<Note>> {
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

/// Reports the detach to the driver when the feed is dropped.
#[derive(Debug)]
struct FeedGuard {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl Drop for FeedGuard {
    fn drop(&mut self) {
        // The driver may already be gone; nothing to report then.
        let _ = self.cmd_tx.send(Command::Detach);
    }
}
