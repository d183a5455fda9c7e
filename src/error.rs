//! Error taxonomy shared by the reporter and the viewer.
//!
//! Location and store failures are typed so each one can be turned into a
//! rendered state at the boundary where it happens. Nothing here is meant to
//! escape a running loop.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    LocationUnsupported,
    LocationPermissionDenied,
    LocationUnavailable,
    LocationTimeout,
    LocationUnknownError,
    StoreWriteFailed,
    StoreSubscribeFailed,
    NoRecordYet,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::LocationUnsupported => "LocationUnsupported",
            ErrorKind::LocationPermissionDenied => "LocationPermissionDenied",
            ErrorKind::LocationUnavailable => "LocationUnavailable",
            ErrorKind::LocationTimeout => "LocationTimeout",
            ErrorKind::LocationUnknownError => "LocationUnknownError",
            ErrorKind::StoreWriteFailed => "StoreWriteFailed",
            ErrorKind::StoreSubscribeFailed => "StoreSubscribeFailed",
            ErrorKind::NoRecordYet => "NoRecordYet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location services are not supported")]
    Unsupported,
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    Unavailable(String),
    #[error("location request timed out after {0}ms")]
    Timeout(u64),
    #[error("unknown location error: {0}")]
    Unknown(String),
}

impl LocationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LocationError::Unsupported => ErrorKind::LocationUnsupported,
            LocationError::PermissionDenied => ErrorKind::LocationPermissionDenied,
            LocationError::Unavailable(_) => ErrorKind::LocationUnavailable,
            LocationError::Timeout(_) => ErrorKind::LocationTimeout,
            LocationError::Unknown(_) => ErrorKind::LocationUnknownError,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store write failed: {0}")]
    WriteFailed(String),
    #[error("store subscription failed: {0}")]
    SubscribeFailed(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::WriteFailed(_) => ErrorKind::StoreWriteFailed,
            StoreError::SubscribeFailed(_) => ErrorKind::StoreSubscribeFailed,
        }
    }

    /// The backend's own message, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            StoreError::WriteFailed(message) | StoreError::SubscribeFailed(message) => message,
        }
    }

    pub(crate) fn write(err: anyhow::Error) -> Self {
        StoreError::WriteFailed(format!("{err:#}"))
    }

    pub(crate) fn subscribe(err: anyhow::Error) -> Self {
        StoreError::SubscribeFailed(format!("{err:#}"))
    }
}
