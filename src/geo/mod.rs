pub mod distance;

pub use distance::{classify, haversine_distance_m, GeoPoint, Proximity, EARTH_RADIUS_M};
