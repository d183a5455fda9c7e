use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Result of comparing a sampled point against the reference point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proximity {
    pub distance_m: f64,
    pub within: bool,
}

impl Proximity {
    pub fn rounded_meters(&self) -> u64 {
        self.distance_m.round().max(0.0) as u64
    }
}

/// Great-circle distance between two points in meters.
pub fn haversine_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi_a = a.latitude.to_radians();
    let phi_b = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi_a.cos() * phi_b.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `h` just past 1.0 for antipodal points.
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Boundary is inclusive: a sample exactly `allowed_radius_m` away is within.
pub fn classify(reference: GeoPoint, sample: GeoPoint, allowed_radius_m: f64) -> Proximity {
    let distance_m = haversine_distance_m(reference, sample);
    Proximity {
        distance_m,
        within: distance_m <= allowed_radius_m,
    }
}
