//! Concrete position sources selectable from configuration.

use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;

use crate::error::LocationError;
use crate::geo::GeoPoint;

use super::provider::{LocationProvider, LocationRequest, PositionFix};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Used when no location source is configured; every request fails.
pub struct UnsupportedProvider;

#[async_trait]
impl LocationProvider for UnsupportedProvider {
    fn source_tag(&self) -> &'static str {
        "none"
    }

    async fn current_position(
        &self,
        _request: &LocationRequest,
    ) -> Result<PositionFix, LocationError> {
        Err(LocationError::Unsupported)
    }
}

/// Always reports the same coordinate, stamped with the request time.
pub struct FixedProvider {
    point: GeoPoint,
    accuracy_meters: Option<f64>,
}

impl FixedProvider {
    pub fn new(point: GeoPoint, accuracy_meters: Option<f64>) -> Self {
        Self {
            point,
            accuracy_meters,
        }
    }
}

#[async_trait]
impl LocationProvider for FixedProvider {
    fn source_tag(&self) -> &'static str {
        "fixed"
    }

    async fn current_position(
        &self,
        _request: &LocationRequest,
    ) -> Result<PositionFix, LocationError> {
        Ok(PositionFix {
            point: self.point,
            accuracy_meters: self.accuracy_meters,
            captured_at: Utc::now(),
        })
    }
}

/// Reads the latest fix from a JSON file kept current by an external GPS bridge.
///
/// Expected shape: `{"latitude": .., "longitude": .., "accuracyMeters": .., "timestamp": "<rfc3339>"}`
/// with `accuracyMeters` and `timestamp` optional.
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl LocationProvider for FileProvider {
    fn source_tag(&self) -> &'static str {
        "file"
    }

    async fn current_position(
        &self,
        request: &LocationRequest,
    ) -> Result<PositionFix, LocationError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == IoErrorKind::NotFound => {
                return Err(LocationError::Unavailable(format!(
                    "no fix at {}",
                    self.path.display()
                )));
            }
            Err(err) if err.kind() == IoErrorKind::PermissionDenied => {
                return Err(LocationError::PermissionDenied);
            }
            Err(err) => {
                return Err(LocationError::Unknown(format!(
                    "failed to read {}: {err}",
                    self.path.display()
                )));
            }
        };

        if contents.trim().is_empty() {
            return Err(LocationError::Unavailable(format!(
                "{} is empty",
                self.path.display()
            )));
        }

        let fix: PositionFix = serde_json::from_str(&contents).map_err(|err| {
            LocationError::Unknown(format!("malformed fix in {}: {err}", self.path.display()))
        })?;

        if !fix.point.is_valid() {
            return Err(LocationError::Unavailable(format!(
                "fix out of range: {}, {}",
                fix.point.latitude, fix.point.longitude
            )));
        }

        if request.high_accuracy {
            if let Some(accuracy) = fix.accuracy_meters {
                if accuracy > 100.0 {
                    log_warn!(
                        "high accuracy requested but fix in {} is only accurate to {:.0}m",
                        self.path.display(),
                        accuracy
                    );
                }
            }
        }

        Ok(fix)
    }
}
