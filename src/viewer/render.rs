//! Turns store events into what the viewer shows.
//!
//! The verdict is deliberately inverted: a person at the office reads `NO`,
//! a person away reads `YES`. Keep it that way.

use std::time::Duration;

use crate::error::{ErrorKind, StoreError};
use crate::models::StatusRecord;
use crate::ui::format::{format_coordinates, format_distance, relative_time};
use crate::ui::{Region, Surface};

pub const VERDICT_AT_TARGET: &str = "NO";
pub const VERDICT_AWAY: &str = "YES";
pub const VERDICT_UNKNOWN: &str = "?";
pub const VERDICT_CONNECTION_ERROR: &str = "Connection error";
pub const CONNECTING: &str = "Connecting...";
pub const NO_STATUS_SUBTITLE: &str = "No status yet";
pub const NO_STATUS_DETAIL: &str = "No status has been reported yet";
pub const DISCONNECTED: &str = "Disconnected";

const MINUTE_MS: i64 = 60_000;
const DAY_MS: i64 = 24 * 60 * MINUTE_MS;

/// Time until the rendered text of `record` would change with no new write:
/// the moment it turns stale, or the next minute step of its relative label.
pub fn next_refresh_in(record: &StatusRecord, now_ms: i64, stale_after_ms: i64) -> Option<Duration> {
    let stale_in = record
        .server_timestamp
        .map(|written_at| written_at + stale_after_ms + 1 - now_ms)
        .filter(|remaining| *remaining > 0);

    let elapsed = now_ms.saturating_sub(record.sampled_at_epoch_millis).max(0);
    let label_in = (elapsed < DAY_MS).then(|| MINUTE_MS - elapsed % MINUTE_MS);

    let next = match (stale_in, label_in) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };
    Some(Duration::from_millis(next as u64))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub verdict: &'static str,
    pub live: bool,
    pub distance: String,
    pub coordinates: String,
    pub updated: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// Nothing stored under the key yet.
    Unknown,
    Status(StatusView),
    ConnectionError(String),
}

impl ViewState {
    pub fn from_record(record: Option<&StatusRecord>, now_ms: i64, stale_after_ms: i64) -> Self {
        let Some(record) = record else {
            return ViewState::Unknown;
        };

        let verdict = if record.at_target {
            VERDICT_AT_TARGET
        } else {
            VERDICT_AWAY
        };
        let live = record
            .server_timestamp
            .map(|written_at| now_ms.saturating_sub(written_at) <= stale_after_ms)
            .unwrap_or(false);

        ViewState::Status(StatusView {
            verdict,
            live,
            distance: format_distance(record.distance_meters),
            coordinates: format_coordinates(record.coordinates()),
            updated: relative_time(record.sampled_at_epoch_millis, now_ms),
        })
    }

    pub fn from_error(err: &StoreError) -> Self {
        ViewState::ConnectionError(err.message().to_string())
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ViewState::Unknown => Some(ErrorKind::NoRecordYet),
            ViewState::Status(_) => None,
            ViewState::ConnectionError(_) => Some(ErrorKind::StoreSubscribeFailed),
        }
    }

    pub fn paint(&self, surface: &dyn Surface) {
        match self {
            ViewState::Unknown => {
                surface.render(Region::Verdict, VERDICT_UNKNOWN);
                surface.render(Region::Subtitle, NO_STATUS_SUBTITLE);
                surface.render(Region::Detail, NO_STATUS_DETAIL);
            }
            ViewState::Status(view) => {
                let indicator = if view.live { "Live" } else { "Stale" };
                surface.render(Region::Verdict, view.verdict);
                surface.render(
                    Region::Subtitle,
                    &format!("{indicator} · updated {}", view.updated),
                );
                surface.render(
                    Region::Detail,
                    &format!(
                        "Distance: {} · Location: {} · Updated: {}",
                        view.distance, view.coordinates, view.updated
                    ),
                );
            }
            ViewState::ConnectionError(message) => {
                surface.render(Region::Verdict, VERDICT_CONNECTION_ERROR);
                surface.render(Region::Subtitle, DISCONNECTED);
                surface.render(Region::Detail, message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MemorySurface;

    const NOW: i64 = 1_790_000_000_000;
    const STALE_AFTER: i64 = 90_000;

    fn record(at_target: bool) -> StatusRecord {
        StatusRecord {
            at_target,
            latitude: Some(40.742352),
            longitude: Some(-74.00621),
            distance_meters: 1500,
            sampled_at_epoch_millis: NOW - 90_000,
            server_timestamp: Some(NOW - 89_000),
            sequence: 7,
        }
    }

    #[test]
    fn absent_record_is_unknown_not_an_error() {
        let state = ViewState::from_record(None, NOW, STALE_AFTER);
        assert_eq!(state, ViewState::Unknown);
        assert_eq!(state.kind(), Some(ErrorKind::NoRecordYet));

        let surface = MemorySurface::new();
        state.paint(&surface);
        assert_eq!(surface.get(Region::Verdict).as_deref(), Some(VERDICT_UNKNOWN));
        assert_eq!(surface.get(Region::Detail).as_deref(), Some(NO_STATUS_DETAIL));
    }

    #[test]
    fn at_target_renders_inverted_negative_verdict() {
        let state = ViewState::from_record(Some(&record(true)), NOW, STALE_AFTER);
        let ViewState::Status(view) = &state else {
            panic!("expected a status view");
        };
        assert_eq!(view.verdict, "NO");

        let away = ViewState::from_record(Some(&record(false)), NOW, STALE_AFTER);
        let ViewState::Status(view) = &away else {
            panic!("expected a status view");
        };
        assert_eq!(view.verdict, "YES");
    }

    #[test]
    fn status_paints_every_region() {
        let surface = MemorySurface::new();
        ViewState::from_record(Some(&record(true)), NOW, STALE_AFTER).paint(&surface);

        assert_eq!(surface.get(Region::Verdict).as_deref(), Some("NO"));
        assert_eq!(
            surface.get(Region::Subtitle).as_deref(),
            Some("Live · updated 1 minutes ago")
        );
        assert_eq!(
            surface.get(Region::Detail).as_deref(),
            Some("Distance: 1.5km · Location: 40.742352, -74.006210 · Updated: 1 minutes ago")
        );
    }

    #[test]
    fn missing_coordinates_render_unknown() {
        let mut record = record(false);
        record.latitude = None;
        record.longitude = None;
        record.distance_meters = 999;

        let ViewState::Status(view) = ViewState::from_record(Some(&record), NOW, STALE_AFTER)
        else {
            panic!("expected a status view");
        };
        assert_eq!(view.coordinates, "Unknown");
        assert_eq!(view.distance, "999m");
    }

    #[test]
    fn live_indicator_follows_server_timestamp() {
        let mut record = record(false);

        record.server_timestamp = Some(NOW - STALE_AFTER);
        let ViewState::Status(view) = ViewState::from_record(Some(&record), NOW, STALE_AFTER)
        else {
            panic!("expected a status view");
        };
        assert!(view.live);

        record.server_timestamp = Some(NOW - STALE_AFTER - 1);
        let ViewState::Status(view) = ViewState::from_record(Some(&record), NOW, STALE_AFTER)
        else {
            panic!("expected a status view");
        };
        assert!(!view.live);

        record.server_timestamp = None;
        let ViewState::Status(view) = ViewState::from_record(Some(&record), NOW, STALE_AFTER)
        else {
            panic!("expected a status view");
        };
        assert!(!view.live);
    }

    #[test]
    fn refresh_lands_on_stale_boundary_or_next_minute() {
        let mut record = record(true);
        record.sampled_at_epoch_millis = NOW - 10_000;
        record.server_timestamp = Some(NOW - 10_000);

        // Label flips to "1 minutes ago" in 50s, staleness in 80s + 1ms.
        assert_eq!(
            next_refresh_in(&record, NOW, STALE_AFTER),
            Some(Duration::from_millis(50_000))
        );

        record.sampled_at_epoch_millis = NOW - 30_000;
        record.server_timestamp = Some(NOW - 89_000);
        assert_eq!(
            next_refresh_in(&record, NOW, STALE_AFTER),
            Some(Duration::from_millis(1_001))
        );

        // Already stale and older than a day: nothing left to change.
        record.sampled_at_epoch_millis = NOW - 2 * DAY_MS;
        record.server_timestamp = Some(NOW - 2 * DAY_MS);
        assert_eq!(next_refresh_in(&record, NOW, STALE_AFTER), None);
    }

    #[test]
    fn connection_error_shows_raw_message() {
        let state = ViewState::from_error(&StoreError::SubscribeFailed(
            "permission_denied at /jasOfficeStatus".into(),
        ));
        assert_eq!(state.kind(), Some(ErrorKind::StoreSubscribeFailed));

        let surface = MemorySurface::new();
        state.paint(&surface);
        assert_eq!(
            surface.get(Region::Verdict).as_deref(),
            Some(VERDICT_CONNECTION_ERROR)
        );
        assert_eq!(surface.get(Region::Subtitle).as_deref(), Some(DISCONNECTED));
        assert_eq!(
            surface.get(Region::Detail).as_deref(),
            Some("permission_denied at /jasOfficeStatus")
        );
    }
}
