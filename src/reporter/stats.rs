use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReporterStatsSnapshot {
    pub cycles_started: u64,
    pub ticks_skipped: u64,
    pub published: u64,
    pub publish_failures: u64,
    pub location_failures: u64,
    pub superseded: u64,
}

/// Running counters for one reporter, shared between the loop and its controller.
pub struct ReporterStats {
    inner: Arc<Mutex<ReporterStatsSnapshot>>,
}

impl ReporterStats {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ReporterStatsSnapshot::default())),
        }
    }

    pub async fn record_cycle_started(&self) {
        self.inner.lock().await.cycles_started += 1;
    }

    pub async fn record_tick_skipped(&self) {
        self.inner.lock().await.ticks_skipped += 1;
    }

    pub async fn record_published(&self) {
        self.inner.lock().await.published += 1;
    }

    pub async fn record_publish_failure(&self) {
        self.inner.lock().await.publish_failures += 1;
    }

    pub async fn record_location_failure(&self) {
        self.inner.lock().await.location_failures += 1;
    }

    pub async fn record_superseded(&self) {
        self.inner.lock().await.superseded += 1;
    }

    pub async fn snapshot(&self) -> ReporterStatsSnapshot {
        self.inner.lock().await.clone()
    }
}

impl Default for ReporterStats {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ReporterStats {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
