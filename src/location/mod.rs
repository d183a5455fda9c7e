pub mod cache;
pub mod provider;
pub mod sources;

use std::sync::Arc;

pub use cache::CachingProvider;
pub use provider::{LocationProvider, LocationRequest, PositionFix};
pub use sources::{FileProvider, FixedProvider, UnsupportedProvider};

use crate::config::LocationSource;

/// Builds the configured source behind a fix cache.
pub fn provider_for(source: &LocationSource) -> Arc<dyn LocationProvider> {
    match source {
        LocationSource::None => Arc::new(CachingProvider::new(UnsupportedProvider)),
        LocationSource::Fixed {
            latitude,
            longitude,
            accuracy_meters,
        } => Arc::new(CachingProvider::new(FixedProvider::new(
            crate::geo::GeoPoint::new(*latitude, *longitude),
            *accuracy_meters,
        ))),
        LocationSource::File { path } => {
            Arc::new(CachingProvider::new(FileProvider::new(path.clone())))
        }
    }
}
