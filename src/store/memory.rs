use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::StoreError;
use crate::models::StatusRecord;

use super::{StatusStore, StoreEvent, SubscriberRegistry, Subscription};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// In-process store. Also carries failure and latency knobs for tests.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, StatusRecord>>,
    registry: SubscriberRegistry,
    write_failure: Mutex<Option<String>>,
    subscribe_failure: Mutex<Option<String>>,
    write_delay: Mutex<Duration>,
    write_count: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<StatusRecord> {
        lock(&self.records).get(key).cloned()
    }

    /// Successful overwrites so far.
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::SeqCst)
    }

    pub fn listener_count(&self, key: &str) -> usize {
        self.registry.listener_count(key)
    }

    /// Makes every following overwrite fail with `message` until cleared with `None`.
    pub fn fail_writes(&self, message: Option<&str>) {
        *lock(&self.write_failure) = message.map(str::to_string);
    }

    /// Makes every following subscribe call fail with `message` until cleared with `None`.
    pub fn refuse_subscriptions(&self, message: Option<&str>) {
        *lock(&self.subscribe_failure) = message.map(str::to_string);
    }

    /// Latency added before each overwrite is applied.
    pub fn set_write_delay(&self, delay: Duration) {
        *lock(&self.write_delay) = delay;
    }

    /// Pushes a transport error to every listener on `key` without detaching them.
    pub fn inject_error(&self, key: &str, message: &str) -> usize {
        self.registry.publish(
            key,
            StoreEvent::Error(StoreError::SubscribeFailed(message.to_string())),
        )
    }
}

#[async_trait]
impl StatusStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn overwrite(&self, key: &str, record: &StatusRecord) -> Result<StatusRecord, StoreError> {
        let delay = *lock(&self.write_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = lock(&self.write_failure).clone() {
            log_warn!("memory store rejecting write to {key}: {message}");
            return Err(StoreError::WriteFailed(message));
        }

        let stored = record.stamped(Utc::now());
        let mut records = lock(&self.records);
        records.insert(key.to_string(), stored.clone());
        self.write_count.fetch_add(1, Ordering::SeqCst);
        self.registry
            .publish(key, StoreEvent::Value(Some(stored.clone())));
        Ok(stored)
    }

    async fn subscribe(&self, key: &str) -> Result<Subscription, StoreError> {
        if let Some(message) = lock(&self.subscribe_failure).clone() {
            return Err(StoreError::SubscribeFailed(message));
        }

        let records = lock(&self.records);
        let current = records.get(key).cloned();
        Ok(self.registry.attach(key, StoreEvent::Value(current)))
    }

    async fn unsubscribe(&self, key: &str) {
        let detached = self.registry.detach(key);
        log_info!("detached {detached} listener(s) from {key}");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
