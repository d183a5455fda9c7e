//! The status record shared between the reporter and every viewer.
//!
//! Stored as a flat mapping of scalars under a single key and replaced
//! wholesale on each report cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::{GeoPoint, Proximity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    pub at_target: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance_meters: u64,
    pub sampled_at_epoch_millis: i64,
    /// Assigned by the store on every overwrite; writers leave it empty.
    #[serde(default)]
    pub server_timestamp: Option<i64>,
    /// Reporter cycle that produced this record.
    #[serde(default)]
    pub sequence: u64,
}

impl StatusRecord {
    pub fn from_sample(
        point: GeoPoint,
        proximity: Proximity,
        sampled_at: DateTime<Utc>,
        sequence: u64,
    ) -> Self {
        Self {
            at_target: proximity.within,
            latitude: Some(point.latitude),
            longitude: Some(point.longitude),
            distance_meters: proximity.rounded_meters(),
            sampled_at_epoch_millis: sampled_at.timestamp_millis(),
            server_timestamp: None,
            sequence,
        }
    }

    pub fn coordinates(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint::new(latitude, longitude)),
            _ => None,
        }
    }

    /// Copy of this record stamped with the store's write time.
    pub fn stamped(&self, server_timestamp: DateTime<Utc>) -> Self {
        Self {
            server_timestamp: Some(server_timestamp.timestamp_millis()),
            ..self.clone()
        }
    }
}
