use anyhow::{bail, Context, Result};
use log::info;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::loop_worker::reporter_loop;
use super::{ReporterContext, ReporterStats, ReporterStatsSnapshot};

/// Owns the reporter's repeating loop. Nothing runs until `start`.
pub struct ReporterController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    stats: Option<ReporterStats>,
}

impl ReporterController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
            stats: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(&mut self, ctx: ReporterContext) -> Result<()> {
        if self.handle.is_some() {
            bail!("reporter already active");
        }

        info!(
            "Starting reporter: {} location source, {} store, key {}",
            ctx.provider.source_tag(),
            ctx.store.backend_tag(),
            ctx.settings.store_key
        );

        let cancel_token = CancellationToken::new();
        let stats = ctx.stats.clone();
        let handle = tokio::spawn(reporter_loop(Arc::new(ctx), cancel_token.clone()));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        self.stats = Some(stats);
        Ok(())
    }

    /// Counters of the current (or last) run.
    pub async fn stats(&self) -> ReporterStatsSnapshot {
        match &self.stats {
            Some(stats) => stats.snapshot().await,
            None => ReporterStatsSnapshot::default(),
        }
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("reporter loop task failed to join")?;
            let stats = self.stats().await;
            info!(
                "Reporter stopped: {} cycle(s), {} published, {} write failure(s), {} location failure(s), {} skipped tick(s)",
                stats.cycles_started,
                stats.published,
                stats.publish_failures,
                stats.location_failures,
                stats.ticks_skipped
            );
        }
        Ok(())
    }
}

impl Default for ReporterController {
    fn default() -> Self {
        Self::new()
    }
}
