use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::mpsc;

use super::{StoreEvent, Subscription};

struct Listener {
    id: u64,
    tx: mpsc::UnboundedSender<StoreEvent>,
}

#[derive(Default)]
struct RegistryInner {
    listeners: Mutex<HashMap<String, Vec<Listener>>>,
    next_id: AtomicU64,
}

impl RegistryInner {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Listener>>> {
        match self.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn remove(&self, key: &str, id: u64) {
        let mut listeners = self.lock();
        if let Some(entries) = listeners.get_mut(key) {
            entries.retain(|listener| listener.id != id);
            if entries.is_empty() {
                listeners.remove(key);
            }
        }
    }
}

/// Ties one `Subscription` to its registry entry; releasing it removes only that entry.
pub(crate) struct ListenerHandle {
    id: u64,
    key: String,
    registry: Weak<RegistryInner>,
}

impl ListenerHandle {
    pub(crate) fn release(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.key, self.id);
        }
    }
}

/// Per-key listener lists shared by the store backends.
#[derive(Default)]
pub struct SubscriberRegistry {
    inner: Arc<RegistryInner>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener and queues `initial` as its first event.
    pub fn attach(&self, key: &str, initial: StoreEvent) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        // The receiver is alive, so this send cannot fail.
        let _ = tx.send(initial);

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .lock()
            .entry(key.to_string())
            .or_default()
            .push(Listener { id, tx });

        let handle = ListenerHandle {
            id,
            key: key.to_string(),
            registry: Arc::downgrade(&self.inner),
        };
        Subscription::new(key.to_string(), rx, handle)
    }

    /// Sends `event` to every live listener on `key`, dropping closed ones.
    /// Returns the number of listeners reached.
    pub fn publish(&self, key: &str, event: StoreEvent) -> usize {
        let mut listeners = self.inner.lock();
        let Some(entries) = listeners.get_mut(key) else {
            return 0;
        };
        entries.retain(|listener| listener.tx.send(event.clone()).is_ok());
        let reached = entries.len();
        if entries.is_empty() {
            listeners.remove(key);
        }
        reached
    }

    /// Drops every listener on `key`; returns how many were attached.
    pub fn detach(&self, key: &str) -> usize {
        self.inner
            .lock()
            .remove(key)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    pub fn listener_count(&self, key: &str) -> usize {
        self.inner
            .lock()
            .get(key)
            .map(|entries| entries.iter().filter(|l| !l.tx.is_closed()).count())
            .unwrap_or(0)
    }

    /// Keys with at least one listener attached.
    pub fn watched_keys(&self) -> Vec<String> {
        self.inner.lock().keys().cloned().collect()
    }
}
