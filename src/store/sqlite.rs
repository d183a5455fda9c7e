use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::db::Database;
use crate::error::StoreError;
use crate::models::StatusRecord;

use super::{StatusStore, StoreEvent, SubscriberRegistry, Subscription};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// How often the file is checked for commits made by other processes.
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_millis(250);

struct Shared {
    db: Database,
    registry: SubscriberRegistry,
    /// Serializes writes, attaches and external syncs so no listener misses an overwrite.
    gate: Mutex<()>,
    /// Last value pushed per key.
    delivered: std::sync::Mutex<HashMap<String, Option<StatusRecord>>>,
}

impl Shared {
    fn remember(&self, key: &str, value: Option<StatusRecord>) {
        let mut delivered = match self.delivered.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        delivered.insert(key.to_string(), value);
    }

    fn differs(&self, key: &str, value: &Option<StatusRecord>) -> bool {
        let delivered = match self.delivered.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        delivered.get(key) != Some(value)
    }

    /// Re-reads every watched key and pushes the ones another process changed.
    async fn sync_watched(&self) {
        let _gate = self.gate.lock().await;
        for key in self.registry.watched_keys() {
            match self.db.get_status_record(&key).await {
                Ok(current) => {
                    if self.differs(&key, &current) {
                        log_info!("external write to {key} picked up");
                        self.registry
                            .publish(&key, StoreEvent::Value(current.clone()));
                        self.remember(&key, current);
                    }
                }
                Err(err) => {
                    log_warn!("failed to re-read {key} after external write: {err:#}");
                    self.registry
                        .publish(&key, StoreEvent::Error(StoreError::subscribe(err)));
                }
            }
        }
    }
}

struct Watcher {
    cancel_token: CancellationToken,
    _handle: JoinHandle<()>,
}

/// Durable store: one SQLite row per key. Listeners hear this store's own writes
/// directly and writes from other processes through a `data_version` watcher.
pub struct SqliteStore {
    shared: Arc<Shared>,
    watch_interval: Duration,
    watcher: std::sync::Mutex<Option<Watcher>>,
}

impl SqliteStore {
    pub fn open(path: PathBuf) -> Result<Self> {
        let db = Database::new(path)?;
        Ok(Self::with_database(db))
    }

    pub fn with_database(db: Database) -> Self {
        Self {
            shared: Arc::new(Shared {
                db,
                registry: SubscriberRegistry::new(),
                gate: Mutex::new(()),
                delivered: std::sync::Mutex::new(HashMap::new()),
            }),
            watch_interval: DEFAULT_WATCH_INTERVAL,
            watcher: std::sync::Mutex::new(None),
        }
    }

    pub fn with_watch_interval(mut self, interval: Duration) -> Self {
        self.watch_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub async fn get(&self, key: &str) -> Result<Option<StatusRecord>> {
        self.shared.db.get_status_record(key).await
    }

    /// Starts the external-write watcher once; needs a tokio runtime.
    fn ensure_watcher(&self) {
        let mut watcher = match self.watcher.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if watcher.is_some() {
            return;
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(watch_external_writes(
            Arc::clone(&self.shared),
            self.watch_interval,
            cancel_token.clone(),
        ));
        *watcher = Some(Watcher {
            cancel_token,
            _handle: handle,
        });
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        let watcher = match self.watcher.get_mut() {
            Ok(watcher) => watcher.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(watcher) = watcher {
            watcher.cancel_token.cancel();
        }
    }
}

async fn watch_external_writes(
    shared: Arc<Shared>,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_version: Option<i64> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel_token.cancelled() => break,
        }

        let version = match shared.db.data_version().await {
            Ok(version) => version,
            Err(err) => {
                log_warn!("failed to read sqlite data_version: {err:#}");
                continue;
            }
        };
        if last_version == Some(version) {
            continue;
        }
        last_version = Some(version);
        shared.sync_watched().await;
    }
}

#[async_trait]
impl StatusStore for SqliteStore {
    fn backend_tag(&self) -> &'static str {
        "sqlite"
    }

    async fn overwrite(&self, key: &str, record: &StatusRecord) -> Result<StatusRecord, StoreError> {
        let shared = &self.shared;
        let _gate = shared.gate.lock().await;
        let stored = record.stamped(Utc::now());

        if let Err(err) = shared.db.upsert_status_record(key, &stored).await {
            log_error!(
                "sqlite store write to {key} at {} failed: {err:#}",
                shared.db.path().display()
            );
            return Err(StoreError::write(err));
        }

        shared
            .registry
            .publish(key, StoreEvent::Value(Some(stored.clone())));
        shared.remember(key, Some(stored.clone()));
        Ok(stored)
    }

    async fn subscribe(&self, key: &str) -> Result<Subscription, StoreError> {
        self.ensure_watcher();

        let shared = &self.shared;
        let _gate = shared.gate.lock().await;
        let current = shared
            .db
            .get_status_record(key)
            .await
            .map_err(StoreError::subscribe)?;
        shared.remember(key, current.clone());
        Ok(shared.registry.attach(key, StoreEvent::Value(current)))
    }

    async fn unsubscribe(&self, key: &str) {
        let detached = self.shared.registry.detach(key);
        log_info!("detached {detached} listener(s) from {key}");
    }
}
