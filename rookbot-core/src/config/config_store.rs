//! Hot-reloadable config store.
//!
//! `ConfigStore<T>` publishes immutable `Arc<T>` snapshots over a `watch`
//! channel. Readers take a snapshot and never hold a lock; a reload swaps
//! the snapshot and wakes every [`ConfigWatcher`].

use std::sync::Arc;
use tokio::sync::watch;

/// A shared, swappable configuration value.
pub struct ConfigStore<T> {
    tx: Arc<watch::Sender<Arc<T>>>,
}

/// Receives notifications when a [`ConfigStore`] is updated.
pub struct ConfigWatcher<T> {
    rx: watch::Receiver<Arc<T>>,
}

impl<T> ConfigStore<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(Arc::new(initial));
        Self { tx: Arc::new(tx) }
    }

    /// Replace the stored value and notify all watchers.
    pub fn update(&self, value: T) {
        self.tx.send_replace(Arc::new(value));
    }

    /// The current value. Later updates do not affect the returned snapshot.
    pub fn snapshot(&self) -> Arc<T> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> ConfigWatcher<T> {
        ConfigWatcher {
            rx: self.tx.subscribe(),
        }
    }
}

impl<T> Clone for ConfigStore<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T: Default> Default for ConfigStore<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> ConfigWatcher<T> {
    /// Wait until the store is updated and return the new snapshot.
    ///
    /// Returns `None` once every [`ConfigStore`] handle has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<T>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
