use chrono::{DateTime, Local};

use crate::error::{LocationError, StoreError};
use crate::geo::Proximity;
use crate::location::PositionFix;
use crate::ui::format::{format_coordinates, format_distance};
use crate::ui::{Region, Surface};

pub const CHECKING: &str = "Checking location...";
pub const AT_TARGET: &str = "At the office";
pub const AWAY: &str = "Not at the office";
pub const LOCATION_ERROR: &str = "Location error";
pub const STATUS_UPDATED: &str = "Status updated";
pub const STATUS_NOT_UPDATED: &str = "Status not updated this cycle";
pub const SUPERSEDED: &str = "Skipped: a newer status was already published";

pub fn location_failure_message(err: &LocationError) -> &'static str {
    match err {
        LocationError::Unsupported => "Geolocation is not supported on this device",
        LocationError::PermissionDenied => "Location permission denied",
        LocationError::Unavailable(_) => "Location information is unavailable",
        LocationError::Timeout(_) => "The request to get your location timed out",
        LocationError::Unknown(_) => "An unknown error occurred while getting your location",
    }
}

pub fn show_checking(surface: &dyn Surface) {
    surface.render(Region::Subtitle, CHECKING);
}

pub fn show_location(surface: &dyn Surface, fix: &PositionFix, proximity: &Proximity) {
    let verdict = if proximity.within { AT_TARGET } else { AWAY };
    surface.render(Region::Verdict, verdict);
    surface.render(
        Region::Detail,
        &format!(
            "{} from the office ({})",
            format_distance(proximity.rounded_meters()),
            format_coordinates(Some(fix.point))
        ),
    );
}

pub fn show_location_failure(surface: &dyn Surface, err: &LocationError) {
    surface.render(Region::Verdict, LOCATION_ERROR);
    surface.render(Region::Detail, location_failure_message(err));
    surface.render(Region::StoreStatus, STATUS_NOT_UPDATED);
}

pub fn show_published(surface: &dyn Surface) {
    surface.render(Region::StoreStatus, STATUS_UPDATED);
}

pub fn show_publish_failure(surface: &dyn Surface, err: &StoreError) {
    surface.render(
        Region::StoreStatus,
        &format!("Store update failed: {}", err.message()),
    );
}

pub fn show_superseded(surface: &dyn Surface) {
    surface.render(Region::StoreStatus, SUPERSEDED);
}

pub fn show_finished(surface: &dyn Surface, at: DateTime<Local>) {
    surface.render(
        Region::Subtitle,
        &format!("Last checked {}", at.format("%H:%M:%S")),
    );
}
