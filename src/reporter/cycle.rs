use chrono::Local;

use crate::error::{LocationError, StoreError};
use crate::geo::classify;
use crate::location::PositionFix;
use crate::models::StatusRecord;

use super::feedback;
use super::ReporterContext;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// No fix; nothing was written.
    LocationFailed { sequence: u64, error: LocationError },
    /// The record as the store accepted it.
    Published { sequence: u64, record: StatusRecord },
    PublishFailed {
        sequence: u64,
        record: StatusRecord,
        error: StoreError,
    },
    /// A later cycle already published; this one did not write.
    Superseded { sequence: u64, latest: u64 },
}

/// Sample, classify, publish. Every failure ends up rendered, never returned.
pub async fn run_cycle(ctx: &ReporterContext, sequence: u64) -> CycleOutcome {
    let surface = ctx.surface.as_ref();
    feedback::show_checking(surface);

    let outcome = match acquire_fix(ctx).await {
        Ok(fix) => publish_fix(ctx, sequence, fix).await,
        Err(error) => {
            log_warn!(
                "cycle {sequence}: {} ({})",
                error.kind().as_str(),
                error
            );
            ctx.stats.record_location_failure().await;
            feedback::show_location_failure(surface, &error);
            CycleOutcome::LocationFailed { sequence, error }
        }
    };

    feedback::show_finished(surface, Local::now());
    outcome
}

async fn acquire_fix(ctx: &ReporterContext) -> Result<PositionFix, LocationError> {
    let request = ctx.settings.request;
    match tokio::time::timeout(request.timeout, ctx.provider.current_position(&request)).await {
        Ok(result) => result,
        Err(_) => Err(LocationError::Timeout(request.timeout.as_millis() as u64)),
    }
}

async fn publish_fix(ctx: &ReporterContext, sequence: u64, fix: PositionFix) -> CycleOutcome {
    let settings = &ctx.settings;
    let surface = ctx.surface.as_ref();

    let proximity = classify(settings.reference, fix.point, settings.allowed_radius_m);
    feedback::show_location(surface, &fix, &proximity);

    let record = StatusRecord::from_sample(fix.point, proximity, fix.captured_at, sequence);

    let mut last_published = ctx.last_published.lock().await;
    if sequence < *last_published {
        log_warn!(
            "cycle {sequence}: dropping stale write, cycle {} already published",
            *last_published
        );
        ctx.stats.record_superseded().await;
        feedback::show_superseded(surface);
        return CycleOutcome::Superseded {
            sequence,
            latest: *last_published,
        };
    }

    match ctx.store.overwrite(&settings.store_key, &record).await {
        Ok(stored) => {
            *last_published = sequence;
            log_info!(
                "cycle {sequence}: published atTarget={} distance={}m to {} store",
                stored.at_target,
                stored.distance_meters,
                ctx.store.backend_tag()
            );
            ctx.stats.record_published().await;
            feedback::show_published(surface);
            CycleOutcome::Published {
                sequence,
                record: stored,
            }
        }
        Err(error) => {
            log_error!("cycle {sequence}: {} ({})", error.kind().as_str(), error);
            ctx.stats.record_publish_failure().await;
            feedback::show_publish_failure(surface, &error);
            CycleOutcome::PublishFailed {
                sequence,
                record,
                error,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::geo::{GeoPoint, EARTH_RADIUS_M};
    use crate::location::{FixedProvider, LocationProvider, LocationRequest, UnsupportedProvider};
    use crate::reporter::{OverlapPolicy, ReporterSettings};
    use crate::store::MemoryStore;
    use crate::ui::{MemorySurface, Region};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    const OFFICE: GeoPoint = GeoPoint::new(40.742352, -74.006210);

    fn settings() -> ReporterSettings {
        ReporterSettings {
            reference: OFFICE,
            allowed_radius_m: 100.0,
            report_interval: Duration::from_secs(30),
            request: LocationRequest::default(),
            store_key: "jasOfficeStatus".into(),
            overlap_policy: OverlapPolicy::SingleFlight,
        }
    }

    fn context(
        provider: Arc<dyn LocationProvider>,
        store: Arc<MemoryStore>,
    ) -> (ReporterContext, Arc<MemorySurface>) {
        let surface = Arc::new(MemorySurface::new());
        let ctx = ReporterContext::new(settings(), provider, store, surface.clone());
        (ctx, surface)
    }

    fn two_hundred_meters_north() -> GeoPoint {
        let meters_per_degree = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        GeoPoint::new(OFFICE.latitude + 200.0 / meters_per_degree, OFFICE.longitude)
    }

    struct FailingProvider(LocationError);

    #[async_trait]
    impl LocationProvider for FailingProvider {
        fn source_tag(&self) -> &'static str {
            "failing"
        }

        async fn current_position(
            &self,
            _request: &LocationRequest,
        ) -> Result<PositionFix, LocationError> {
            Err(self.0.clone())
        }
    }

    struct HangingProvider;

    #[async_trait]
    impl LocationProvider for HangingProvider {
        fn source_tag(&self) -> &'static str {
            "hanging"
        }

        async fn current_position(
            &self,
            _request: &LocationRequest,
        ) -> Result<PositionFix, LocationError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn sample_outside_radius_publishes_away_record() {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(FixedProvider::new(two_hundred_meters_north(), None));
        let (ctx, surface) = context(provider, store.clone());

        let outcome = run_cycle(&ctx, 1).await;

        let record = match outcome {
            CycleOutcome::Published { record, .. } => record,
            other => panic!("expected a published record, got {other:?}"),
        };
        assert!(!record.at_target);
        assert_eq!(record.distance_meters, 200);
        assert!(record.server_timestamp.is_some());
        assert_eq!(store.get("jasOfficeStatus"), Some(record));

        assert_eq!(surface.get(Region::Verdict).as_deref(), Some(feedback::AWAY));
        assert_eq!(
            surface.get(Region::StoreStatus).as_deref(),
            Some(feedback::STATUS_UPDATED)
        );
        assert!(surface
            .get(Region::Detail)
            .unwrap()
            .starts_with("200m from the office"));
    }

    #[tokio::test]
    async fn sample_at_reference_is_at_target() {
        let store = Arc::new(MemoryStore::new());
        let (ctx, surface) = context(Arc::new(FixedProvider::new(OFFICE, None)), store.clone());

        run_cycle(&ctx, 1).await;

        let record = store.get("jasOfficeStatus").unwrap();
        assert!(record.at_target);
        assert_eq!(record.distance_meters, 0);
        assert_eq!(surface.get(Region::Verdict).as_deref(), Some(feedback::AT_TARGET));
    }

    #[tokio::test]
    async fn write_failure_still_renders_classification() {
        let store = Arc::new(MemoryStore::new());
        store.fail_writes(Some("PERMISSION_DENIED"));
        let (ctx, surface) = context(Arc::new(FixedProvider::new(OFFICE, None)), store.clone());

        let outcome = run_cycle(&ctx, 1).await;

        match outcome {
            CycleOutcome::PublishFailed { error, record, .. } => {
                assert_eq!(error.kind(), ErrorKind::StoreWriteFailed);
                assert!(record.at_target);
            }
            other => panic!("expected publish failure, got {other:?}"),
        }
        assert_eq!(surface.get(Region::Verdict).as_deref(), Some(feedback::AT_TARGET));
        assert_eq!(
            surface.get(Region::StoreStatus).as_deref(),
            Some("Store update failed: PERMISSION_DENIED")
        );
        assert_eq!(ctx.stats.snapshot().await.publish_failures, 1);
    }

    #[tokio::test]
    async fn location_failures_never_write() {
        let failures = [
            LocationError::PermissionDenied,
            LocationError::Unavailable("no fix".into()),
            LocationError::Unknown("driver".into()),
        ];

        for failure in failures {
            let store = Arc::new(MemoryStore::new());
            let (ctx, surface) =
                context(Arc::new(FailingProvider(failure.clone())), store.clone());

            let outcome = run_cycle(&ctx, 1).await;

            assert_eq!(
                outcome,
                CycleOutcome::LocationFailed {
                    sequence: 1,
                    error: failure.clone()
                }
            );
            assert_eq!(store.write_count(), 0);
            assert_eq!(
                surface.get(Region::Verdict).as_deref(),
                Some(feedback::LOCATION_ERROR)
            );
            assert_eq!(
                surface.get(Region::Detail).as_deref(),
                Some(feedback::location_failure_message(&failure))
            );
            assert_eq!(
                surface.get(Region::StoreStatus).as_deref(),
                Some(feedback::STATUS_NOT_UPDATED)
            );
        }
    }

    #[tokio::test]
    async fn failure_after_success_replaces_store_status() {
        struct FlakyProvider {
            calls: std::sync::atomic::AtomicU32,
        }

        #[async_trait]
        impl LocationProvider for FlakyProvider {
            fn source_tag(&self) -> &'static str {
                "flaky"
            }

            async fn current_position(
                &self,
                _request: &LocationRequest,
            ) -> Result<PositionFix, LocationError> {
                let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                if call == 0 {
                    Ok(PositionFix::new(OFFICE, chrono::Utc::now()))
                } else {
                    Err(LocationError::Unavailable("lost fix".into()))
                }
            }
        }

        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(FlakyProvider {
            calls: std::sync::atomic::AtomicU32::new(0),
        });
        let (ctx, surface) = context(provider, store.clone());

        run_cycle(&ctx, 1).await;
        assert_eq!(
            surface.get(Region::StoreStatus).as_deref(),
            Some(feedback::STATUS_UPDATED)
        );

        run_cycle(&ctx, 2).await;
        assert_eq!(
            surface.get(Region::StoreStatus).as_deref(),
            Some(feedback::STATUS_NOT_UPDATED)
        );
        assert_eq!(surface.get(Region::Verdict).as_deref(), Some(feedback::LOCATION_ERROR));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn missing_location_source_is_unsupported() {
        let store = Arc::new(MemoryStore::new());
        let (ctx, surface) = context(Arc::new(UnsupportedProvider), store.clone());

        let outcome = run_cycle(&ctx, 1).await;

        assert!(matches!(
            outcome,
            CycleOutcome::LocationFailed {
                error: LocationError::Unsupported,
                ..
            }
        ));
        assert_eq!(
            surface.get(Region::Detail).as_deref(),
            Some("Geolocation is not supported on this device")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fix_times_out() {
        let store = Arc::new(MemoryStore::new());
        let (ctx, surface) = context(Arc::new(HangingProvider), store.clone());

        let outcome = run_cycle(&ctx, 1).await;

        assert_eq!(
            outcome,
            CycleOutcome::LocationFailed {
                sequence: 1,
                error: LocationError::Timeout(15_000)
            }
        );
        assert_eq!(
            surface.get(Region::Detail).as_deref(),
            Some("The request to get your location timed out")
        );
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn older_cycle_does_not_overwrite_newer_one() {
        let store = Arc::new(MemoryStore::new());
        let (ctx, surface) = context(Arc::new(FixedProvider::new(OFFICE, None)), store.clone());

        assert!(matches!(run_cycle(&ctx, 5).await, CycleOutcome::Published { .. }));
        let outcome = run_cycle(&ctx, 4).await;

        assert_eq!(
            outcome,
            CycleOutcome::Superseded {
                sequence: 4,
                latest: 5
            }
        );
        assert_eq!(store.get("jasOfficeStatus").unwrap().sequence, 5);
        assert_eq!(
            surface.get(Region::StoreStatus).as_deref(),
            Some(feedback::SUPERSEDED)
        );

        let stats = ctx.stats.snapshot().await;
        assert_eq!(stats.published, 1);
        assert_eq!(stats.superseded, 1);
        assert_eq!(store.write_count(), 1);
    }
}
