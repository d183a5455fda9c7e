use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;

use crate::error::LocationError;

use super::provider::{LocationProvider, LocationRequest, PositionFix};

const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Reuses the last fix while it is younger than the request's `maximum_age`.
pub struct CachingProvider<P> {
    inner: P,
    last_fix: Mutex<Option<PositionFix>>,
}

impl<P: LocationProvider> CachingProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            last_fix: Mutex::new(None),
        }
    }

    fn cached(&self, request: &LocationRequest) -> Option<PositionFix> {
        let guard = match self.last_fix.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        (*guard).filter(|fix| fix.age_at(Utc::now()) <= request.maximum_age)
    }

    fn remember(&self, fix: PositionFix) {
        let mut guard = match self.last_fix.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(fix);
    }
}

#[async_trait]
impl<P: LocationProvider> LocationProvider for CachingProvider<P> {
    fn source_tag(&self) -> &'static str {
        self.inner.source_tag()
    }

    async fn current_position(
        &self,
        request: &LocationRequest,
    ) -> Result<PositionFix, LocationError> {
        if let Some(fix) = self.cached(request) {
            log_info!(
                "reusing cached {} fix ({}ms old)",
                self.inner.source_tag(),
                fix.age_at(Utc::now()).as_millis()
            );
            return Ok(fix);
        }

        let fix = self.inner.current_position(request).await?;
        self.remember(fix);
        Ok(fix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use chrono::Duration as ChronoDuration;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct CountingProvider {
        calls: AtomicU32,
        captured_offset: ChronoDuration,
    }

    impl CountingProvider {
        fn new(captured_offset: ChronoDuration) -> Self {
            Self {
                calls: AtomicU32::new(0),
                captured_offset,
            }
        }
    }

    #[async_trait]
    impl LocationProvider for CountingProvider {
        fn source_tag(&self) -> &'static str {
            "counting"
        }

        async fn current_position(
            &self,
            _request: &LocationRequest,
        ) -> Result<PositionFix, LocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(PositionFix::new(
                GeoPoint::new(40.0, -74.0),
                Utc::now() - self.captured_offset,
            ))
        }
    }

    #[tokio::test]
    async fn fresh_fix_is_reused_within_maximum_age() {
        let provider = CachingProvider::new(CountingProvider::new(ChronoDuration::zero()));
        let request = LocationRequest::default();

        let first = provider.current_position(&request).await.unwrap();
        let second = provider.current_position(&request).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_fix_triggers_a_new_request() {
        let provider =
            CachingProvider::new(CountingProvider::new(ChronoDuration::seconds(60)));
        let request = LocationRequest {
            maximum_age: Duration::from_secs(30),
            ..LocationRequest::default()
        };

        provider.current_position(&request).await.unwrap();
        provider.current_position(&request).await.unwrap();

        assert_eq!(provider.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        struct Failing;

        #[async_trait]
        impl LocationProvider for Failing {
            fn source_tag(&self) -> &'static str {
                "failing"
            }

            async fn current_position(
                &self,
                _request: &LocationRequest,
            ) -> Result<PositionFix, LocationError> {
                Err(LocationError::PermissionDenied)
            }
        }

        let provider = CachingProvider::new(Failing);
        let err = provider
            .current_position(&LocationRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err, LocationError::PermissionDenied);
        assert!(provider.cached(&LocationRequest::default()).is_none());
    }
}
