//! Named text regions that reporter and viewer states are painted onto.

pub mod format;

use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Primary verdict.
    Verdict,
    /// Subtitle / live indicator.
    Subtitle,
    Detail,
    StoreStatus,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Verdict => "verdict",
            Region::Subtitle => "subtitle",
            Region::Detail => "detail",
            Region::StoreStatus => "store",
        }
    }
}

pub trait Surface: Send + Sync {
    fn render(&self, region: Region, text: &str);
}

/// Prints `[role] region: text` lines to stdout.
pub struct ConsoleSurface {
    role: &'static str,
}

impl ConsoleSurface {
    pub fn new(role: &'static str) -> Self {
        Self { role }
    }
}

impl Surface for ConsoleSurface {
    fn render(&self, region: Region, text: &str) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        if let Err(err) = writeln!(lock, "[{}] {}: {}", self.role, region.as_str(), text) {
            log::warn!("failed to write {} output: {err}", self.role);
        }
    }
}

/// Keeps the latest text per region plus the full render history.
#[derive(Default)]
pub struct MemorySurface {
    inner: Mutex<MemorySurfaceState>,
}

#[derive(Default)]
struct MemorySurfaceState {
    regions: HashMap<Region, String>,
    history: Vec<(Region, String)>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, region: Region) -> Option<String> {
        self.lock().regions.get(&region).cloned()
    }

    pub fn history(&self) -> Vec<(Region, String)> {
        self.lock().history.clone()
    }

    /// Every text ever rendered to `region`, oldest first.
    pub fn history_for(&self, region: Region) -> Vec<String> {
        self.lock()
            .history
            .iter()
            .filter(|(r, _)| *r == region)
            .map(|(_, text)| text.clone())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemorySurfaceState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Surface for MemorySurface {
    fn render(&self, region: Region, text: &str) {
        let mut state = self.lock();
        state.regions.insert(region, text.to_string());
        state.history.push((region, text.to_string()));
    }
}
