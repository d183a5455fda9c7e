use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::LocationError;
use crate::geo::GeoPoint;

/// Options attached to every position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationRequest {
    pub high_accuracy: bool,
    /// Time after which the request is treated as failed.
    pub timeout: Duration,
    /// Oldest cached fix that may be returned instead of a fresh one.
    pub maximum_age: Duration,
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_millis(15_000),
            maximum_age: Duration::from_millis(30_000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionFix {
    #[serde(flatten)]
    pub point: GeoPoint,
    #[serde(default)]
    pub accuracy_meters: Option<f64>,
    #[serde(rename = "timestamp", default = "Utc::now")]
    pub captured_at: DateTime<Utc>,
}

impl PositionFix {
    pub fn new(point: GeoPoint, captured_at: DateTime<Utc>) -> Self {
        Self {
            point,
            accuracy_meters: None,
            captured_at,
        }
    }

    /// Age at `now`; a fix stamped in the future counts as brand new.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.captured_at).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Source of device positions. One call is one asynchronous position request.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    fn source_tag(&self) -> &'static str;

    async fn current_position(
        &self,
        request: &LocationRequest,
    ) -> Result<PositionFix, LocationError>;
}
