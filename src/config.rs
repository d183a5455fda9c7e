use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::geo::GeoPoint;
use crate::location::LocationRequest;
use crate::reporter::{OverlapPolicy, ReporterSettings};
use crate::viewer::ViewerSettings;

pub const DEFAULT_CONFIG_FILE: &str = "presence.json";
pub const DEFAULT_STORE_KEY: &str = "jasOfficeStatus";
pub const DEFAULT_REFERENCE: GeoPoint = GeoPoint::new(40.742352, -74.006210);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StoreBackend {
    Memory,
    Sqlite { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LocationSource {
    None,
    Fixed {
        latitude: f64,
        longitude: f64,
        #[serde(rename = "accuracyMeters", default)]
        accuracy_meters: Option<f64>,
    },
    File {
        path: PathBuf,
    },
}

/// Everything the reporter and viewer need, fixed for the life of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PresenceConfig {
    pub reference: GeoPoint,
    pub allowed_radius_m: f64,
    pub report_interval_ms: u64,
    pub location_timeout_ms: u64,
    pub maximum_age_ms: u64,
    pub high_accuracy: bool,
    pub store_key: String,
    pub store: StoreBackend,
    pub location_source: LocationSource,
    pub overlap_policy: OverlapPolicy,
    /// A record whose server timestamp is older than this is shown as stale.
    pub stale_after_ms: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            reference: DEFAULT_REFERENCE,
            allowed_radius_m: 100.0,
            report_interval_ms: 30_000,
            location_timeout_ms: 15_000,
            maximum_age_ms: 30_000,
            high_accuracy: true,
            store_key: DEFAULT_STORE_KEY.into(),
            store: StoreBackend::Memory,
            location_source: LocationSource::None,
            overlap_policy: OverlapPolicy::SingleFlight,
            stale_after_ms: 90_000,
        }
    }
}

impl PresenceConfig {
    /// Missing file means defaults; anything unreadable or malformed is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config in {}", path.display()))?
        } else {
            PresenceConfig::default()
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.reference.is_valid() {
            bail!(
                "reference point ({}, {}) is out of range",
                self.reference.latitude,
                self.reference.longitude
            );
        }
        if !(self.allowed_radius_m.is_finite() && self.allowed_radius_m > 0.0) {
            bail!("allowedRadiusM must be positive, got {}", self.allowed_radius_m);
        }
        if self.report_interval_ms == 0 {
            bail!("reportIntervalMs must be greater than zero");
        }
        if self.location_timeout_ms == 0 {
            bail!("locationTimeoutMs must be greater than zero");
        }
        if self.store_key.trim().is_empty() {
            bail!("storeKey must not be empty");
        }
        if let LocationSource::Fixed {
            latitude,
            longitude,
            ..
        } = self.location_source
        {
            if !GeoPoint::new(latitude, longitude).is_valid() {
                bail!("fixed location ({latitude}, {longitude}) is out of range");
            }
        }
        Ok(())
    }

    pub fn location_request(&self) -> LocationRequest {
        LocationRequest {
            high_accuracy: self.high_accuracy,
            timeout: Duration::from_millis(self.location_timeout_ms),
            maximum_age: Duration::from_millis(self.maximum_age_ms),
        }
    }

    pub fn reporter_settings(&self) -> ReporterSettings {
        ReporterSettings {
            reference: self.reference,
            allowed_radius_m: self.allowed_radius_m,
            report_interval: Duration::from_millis(self.report_interval_ms),
            request: self.location_request(),
            store_key: self.store_key.clone(),
            overlap_policy: self.overlap_policy,
        }
    }

    pub fn viewer_settings(&self) -> ViewerSettings {
        ViewerSettings {
            store_key: self.store_key.clone(),
            stale_after: Duration::from_millis(self.stale_after_ms),
        }
    }
}
