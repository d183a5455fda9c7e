pub mod controller;
pub mod cycle;
pub mod feedback;
pub mod loop_worker;
pub mod stats;

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::geo::GeoPoint;
use crate::location::{LocationProvider, LocationRequest};
use crate::store::SharedStore;
use crate::ui::Surface;

pub use controller::ReporterController;
pub use cycle::{run_cycle, CycleOutcome};
pub use stats::{ReporterStats, ReporterStatsSnapshot};

/// What happens when the interval fires while the previous cycle is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum OverlapPolicy {
    /// Skip the tick; at most one cycle is in flight.
    #[default]
    SingleFlight,
    /// Start another cycle; writes older than the last published one are dropped.
    Overlap,
}

#[derive(Debug, Clone)]
pub struct ReporterSettings {
    pub reference: GeoPoint,
    pub allowed_radius_m: f64,
    pub report_interval: Duration,
    pub request: LocationRequest,
    pub store_key: String,
    pub overlap_policy: OverlapPolicy,
}

/// Collaborators and shared state for every cycle of one reporter run.
pub struct ReporterContext {
    pub settings: ReporterSettings,
    pub provider: Arc<dyn LocationProvider>,
    pub store: SharedStore,
    pub surface: Arc<dyn Surface>,
    pub stats: ReporterStats,
    next_sequence: AtomicU64,
    /// Sequence of the last record that reached the store.
    last_published: Mutex<u64>,
}

impl ReporterContext {
    pub fn new(
        settings: ReporterSettings,
        provider: Arc<dyn LocationProvider>,
        store: SharedStore,
        surface: Arc<dyn Surface>,
    ) -> Self {
        Self {
            settings,
            provider,
            store,
            surface,
            stats: ReporterStats::new(),
            next_sequence: AtomicU64::new(1),
            last_published: Mutex::new(0),
        }
    }

    pub(crate) fn take_sequence(&self) -> u64 {
        self.next_sequence.fetch_add(1, Ordering::SeqCst)
    }
}
