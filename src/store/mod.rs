//! Key-value status store with push-based change notification.
//!
//! The reporter overwrites one record per key; viewers subscribe to the key and
//! receive the current value on attach and again after every overwrite.

mod fanout;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::StoreError;
use crate::models::StatusRecord;

use fanout::ListenerHandle;
pub use fanout::SubscriberRegistry;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// Current value of the key; `None` when nothing has been written yet.
    Value(Option<StatusRecord>),
    /// Transport or auth failure reported by the backend.
    Error(StoreError),
}

/// Live feed of events for one key. Dropping it detaches this listener only.
pub struct Subscription {
    key: String,
    events: mpsc::UnboundedReceiver<StoreEvent>,
    listener: ListenerHandle,
}

impl Subscription {
    pub(crate) fn new(
        key: String,
        events: mpsc::UnboundedReceiver<StoreEvent>,
        listener: ListenerHandle,
    ) -> Self {
        Self {
            key,
            events,
            listener,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Next event, or `None` once the store has detached this listener.
    pub async fn next(&mut self) -> Option<StoreEvent> {
        self.events.recv().await
    }

    /// Detaches this listener now; other listeners on the key are untouched.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.listener.release();
    }
}

#[async_trait]
pub trait StatusStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    /// Replaces the record under `key` and returns it as stored, server timestamp included.
    async fn overwrite(&self, key: &str, record: &StatusRecord) -> Result<StatusRecord, StoreError>;

    async fn subscribe(&self, key: &str) -> Result<Subscription, StoreError>;

    /// Detaches every listener on `key`; their subscriptions end.
    /// A single listener detaches by dropping its `Subscription`.
    async fn unsubscribe(&self, key: &str);
}

pub type SharedStore = Arc<dyn StatusStore>;

/// Opens the configured backend.
pub fn open(backend: &crate::config::StoreBackend) -> anyhow::Result<SharedStore> {
    match backend {
        crate::config::StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        crate::config::StoreBackend::Sqlite { path } => {
            Ok(Arc::new(SqliteStore::open(path.clone())?))
        }
    }
}
