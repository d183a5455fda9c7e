//! Text formatting shared by the reporter feedback and the viewer.

use chrono::{Local, TimeZone};

use crate::geo::GeoPoint;

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// `999m` below a kilometer, `1.5km` from there on.
pub fn format_distance(meters: u64) -> String {
    if meters < 1000 {
        format!("{meters}m")
    } else {
        format!("{:.1}km", meters as f64 / 1000.0)
    }
}

pub fn format_coordinates(point: Option<GeoPoint>) -> String {
    match point {
        Some(point) => format!("{:.6}, {:.6}", point.latitude, point.longitude),
        None => "Unknown".to_string(),
    }
}

/// Label for a sample taken at `sampled_at_ms`, seen at `now_ms`.
pub fn relative_time(sampled_at_ms: i64, now_ms: i64) -> String {
    let elapsed = now_ms.saturating_sub(sampled_at_ms);

    if elapsed < MINUTE_MS {
        "Just now".to_string()
    } else if elapsed < HOUR_MS {
        format!("{} minutes ago", elapsed / MINUTE_MS)
    } else if elapsed < DAY_MS {
        format!("{} hours ago", elapsed / HOUR_MS)
    } else {
        absolute_time(sampled_at_ms)
    }
}

fn absolute_time(epoch_ms: i64) -> String {
    match Local.timestamp_millis_opt(epoch_ms).single() {
        Some(at) => at.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "Unknown".to_string(),
    }
}
