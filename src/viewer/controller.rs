use anyhow::{bail, Context, Result};
use chrono::Utc;
use log::info;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::models::StatusRecord;
use crate::store::{SharedStore, StoreEvent};
use crate::ui::{Region, Surface};

use super::render::{next_refresh_in, ViewState, CONNECTING};
use super::ViewerSettings;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Owns the viewer's subscription task. Nothing is subscribed until `start`.
pub struct ViewerController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    store_key: Option<String>,
}

impl ViewerController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
            store_key: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(
        &mut self,
        store: SharedStore,
        settings: ViewerSettings,
        surface: Arc<dyn Surface>,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("viewer already active");
        }

        info!(
            "Starting viewer: {} store, key {}",
            store.backend_tag(),
            settings.store_key
        );

        let cancel_token = CancellationToken::new();
        let key = settings.store_key.clone();
        let handle = tokio::spawn(viewer_loop(store, settings, surface, cancel_token.clone()));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        self.store_key = Some(key);
        Ok(())
    }

    /// Ends this viewer's subscription only; other listeners on the key stay attached.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle.await.context("viewer task failed to join")?;
        }

        if let Some(key) = self.store_key.take() {
            info!("Viewer stopped: detached from {key}");
        }
        Ok(())
    }
}

impl Default for ViewerController {
    fn default() -> Self {
        Self::new()
    }
}

/// Wall-clock milliseconds advanced by the runtime's monotonic clock.
struct ViewClock {
    wall_origin_ms: i64,
    origin: Instant,
}

impl ViewClock {
    fn start() -> Self {
        Self {
            wall_origin_ms: Utc::now().timestamp_millis(),
            origin: Instant::now(),
        }
    }

    fn now_ms(&self) -> i64 {
        self.wall_origin_ms + self.origin.elapsed().as_millis() as i64
    }
}

async fn refresh_after(delay: Option<Duration>) {
    match delay {
        Some(delay) => tokio::time::sleep(delay).await,
        None => std::future::pending().await,
    }
}

async fn viewer_loop(
    store: SharedStore,
    settings: ViewerSettings,
    surface: Arc<dyn Surface>,
    cancel_token: CancellationToken,
) {
    let stale_after_ms = settings.stale_after.as_millis() as i64;
    let clock = ViewClock::start();
    surface.render(Region::Subtitle, CONNECTING);

    let subscribed = tokio::select! {
        result = store.subscribe(&settings.store_key) => result,
        _ = cancel_token.cancelled() => return,
    };

    let mut subscription = match subscribed {
        Ok(subscription) => subscription,
        Err(err) => {
            log_warn!("viewer could not subscribe to {}: {err}", settings.store_key);
            ViewState::from_error(&err).paint(surface.as_ref());
            return;
        }
    };

    log_info!("viewer subscribed to {}", subscription.key());

    // Last record on screen; repainted locally as it ages.
    let mut shown: Option<StatusRecord> = None;

    loop {
        let refresh = shown
            .as_ref()
            .and_then(|record| next_refresh_in(record, clock.now_ms(), stale_after_ms));

        tokio::select! {
            event = subscription.next() => match event {
                Some(StoreEvent::Value(record)) => {
                    ViewState::from_record(record.as_ref(), clock.now_ms(), stale_after_ms)
                        .paint(surface.as_ref());
                    shown = record;
                }
                Some(StoreEvent::Error(err)) => {
                    log_warn!("viewer subscription error on {}: {err}", subscription.key());
                    ViewState::from_error(&err).paint(surface.as_ref());
                    shown = None;
                }
                None => {
                    log_info!("store closed the subscription to {}", subscription.key());
                    break;
                }
            },
            _ = refresh_after(refresh) => {
                ViewState::from_record(shown.as_ref(), clock.now_ms(), stale_after_ms)
                    .paint(surface.as_ref());
            }
            _ = cancel_token.cancelled() => break,
        }
    }

    subscription.close();
}
