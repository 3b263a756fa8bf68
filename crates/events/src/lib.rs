//! Live collection snapshots.
//!
//! A [`SnapshotHub`] keeps one watch channel per collection. Every publish
//! replaces the whole collection state; subscribers never see deltas, only
//! the latest full snapshot. A subscriber that falls behind skips straight to
//! the newest state.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Full state of a collection at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub collection: String,
    /// Bumped by one on every publish. The seed snapshot has version 0.
    pub version: u64,
    pub items: Vec<T>,
}

impl<T> Snapshot<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Fan-out point for collection snapshots.
pub struct SnapshotHub<T> {
    channels: Mutex<HashMap<String, watch::Sender<Snapshot<T>>>>,
}

impl<T: Clone> SnapshotHub<T> {
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<String, watch::Sender<Snapshot<T>>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the snapshot of `collection` and wake every subscriber.
    /// Returns the new version.
    pub fn publish(&self, collection: &str, items: Vec<T>) -> u64 {
        let mut channels = self.channels();

        let version = match channels.get(collection) {
            Some(sender) => {
                let mut version = 0;
                sender.send_modify(|snapshot| {
                    snapshot.version += 1;
                    snapshot.items = items;
                    version = snapshot.version;
                });
                version
            }
            None => {
                let (sender, _) = watch::channel(Snapshot {
                    collection: collection.to_string(),
                    version: 1,
                    items,
                });
                channels.insert(collection.to_string(), sender);
                1
            }
        };

        tracing::trace!(collection, version, "snapshot published");
        version
    }

    /// Register a subscriber. `seed` provides the initial state when the
    /// collection has never been published.
    pub fn subscribe<F>(&self, collection: &str, seed: F) -> Subscription<T>
    where
        F: FnOnce() -> Vec<T>,
    {
        let mut channels = self.channels();

        let receiver = match channels.get(collection) {
            Some(sender) => sender.subscribe(),
            None => {
                let (sender, receiver) = watch::channel(Snapshot {
                    collection: collection.to_string(),
                    version: 0,
                    items: seed(),
                });
                channels.insert(collection.to_string(), sender);
                receiver
            }
        };

        tracing::debug!(collection, "subscriber registered");

        Subscription {
            receiver,
            primed: false,
        }
    }

    /// Number of live subscriptions on `collection`.
    pub fn subscriber_count(&self, collection: &str) -> usize {
        self.channels()
            .get(collection)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

impl<T: Clone> Default for SnapshotHub<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Standing subscription to one collection. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription<T> {
    receiver: watch::Receiver<Snapshot<T>>,
    primed: bool,
}

impl<T: Clone> Subscription<T> {
    /// Wait for the next snapshot.
    ///
    /// The first call resolves immediately with the current state. Later
    /// calls wait for a change. Returns `None` once the hub is gone.
    pub async fn next(&mut self) -> Option<Snapshot<T>> {
        if !self.primed {
            self.primed = true;
            return Some(self.receiver.borrow_and_update().clone());
        }

        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}

impl<T> Subscription<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Convert into a stream that yields the current snapshot and then one
    /// item per change.
    pub fn into_stream(self) -> WatchStream<Snapshot<T>> {
        WatchStream::new(self.receiver)
    }
}
