//! Change notification and debounced refresh
//!
//! The original application leaned on its backend's realtime push to refetch
//! data after every edit. Here the server owns the data, so the equivalent
//! is in-process: write handlers publish which collection changed, and
//! interested parties subscribe. Rapid successive edits are expected, so
//! subscribers usually sit behind a [`Debouncer`] that coalesces a burst of
//! triggers within a window into a single refresh run.
//!
//! Dropping a [`ChangeSubscription`] unsubscribes; dropping a [`Debouncer`]
//! cancels its pending run.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::debug;

/// Collections whose changes are announced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Slots,
    Admins,
    Registrations,
    Classes,
    Attendance,
    Settings,
}

impl Collection {
    /// Collection name for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Slots => "slots",
            Collection::Admins => "admins",
            Collection::Registrations => "registrations",
            Collection::Classes => "classes",
            Collection::Attendance => "attendance",
            Collection::Settings => "settings",
        }
    }
}

/// Broadcast sender for collection changes
///
/// Cloneable; all clones share one channel. Publishing never blocks and
/// silently drops the event when nobody is subscribed.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<Collection>,
}

impl ChangeNotifier {
    /// Creates a notifier with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Announces a change to one collection
    pub fn publish(&self, collection: Collection) {
        debug!(collection = collection.as_str(), "Collection changed");
        // No subscribers is fine; the event is simply dropped.
        let _ = self.tx.send(collection);
    }

    /// Subscribes to future changes
    pub fn subscribe(&self) -> ChangeSubscription {
        ChangeSubscription {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Handle for one subscriber; drop to unsubscribe
#[derive(Debug)]
pub struct ChangeSubscription {
    rx: broadcast::Receiver<Collection>,
}

impl ChangeSubscription {
    /// Waits for the next change
    ///
    /// Returns `None` once the notifier is gone. A slow subscriber that
    /// misses events skips ahead rather than erroring; the consumer is a
    /// refetch loop, so missed intermediate events are harmless.
    pub async fn next(&mut self) -> Option<Collection> {
        loop {
            match self.rx.recv().await {
                Ok(collection) => return Some(collection),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Change subscription lagged, skipping ahead");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Single-flight debouncer
///
/// N triggers within the window collapse into one invocation of the action.
/// The window opens at the first trigger; triggers arriving while the
/// window is open (or while the action runs) fold into the same pending run.
pub struct Debouncer {
    tx: mpsc::UnboundedSender<()>,
    task: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// Creates a debouncer that runs `action` at most once per window
    pub fn new<F, Fut>(window: Duration, mut action: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let task = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                tokio::time::sleep(window).await;

                // Fold every trigger that arrived during the window into
                // this run.
                while rx.try_recv().is_ok() {}

                action().await;
            }
        });

        Self {
            tx,
            task: Some(task),
        }
    }

    /// Requests a run; coalesced with other pending triggers
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
