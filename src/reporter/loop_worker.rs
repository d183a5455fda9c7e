use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::cycle::{run_cycle, CycleOutcome};
use super::{OverlapPolicy, ReporterContext};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Runs a cycle immediately, then on every interval tick until cancelled.
pub async fn reporter_loop(ctx: Arc<ReporterContext>, cancel_token: CancellationToken) {
    let period = ctx.settings.report_interval.max(Duration::from_millis(1));
    let policy = ctx.settings.overlap_policy;

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut in_flight: JoinSet<CycleOutcome> = JoinSet::new();

    log_info!(
        "reporter loop started: every {}ms, {:?}, key {}",
        period.as_millis(),
        policy,
        ctx.settings.store_key
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if policy == OverlapPolicy::SingleFlight && !in_flight.is_empty() {
                    log_warn!("previous cycle still running; skipping this tick");
                    ctx.stats.record_tick_skipped().await;
                    continue;
                }

                let sequence = ctx.take_sequence();
                ctx.stats.record_cycle_started().await;
                let cycle_ctx = Arc::clone(&ctx);
                in_flight.spawn(async move { run_cycle(&cycle_ctx, sequence).await });
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(err) = joined {
                    if !err.is_cancelled() {
                        log_error!("reporter cycle task failed: {err}");
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("reporter loop shutting down ({} cycle(s) in flight)", in_flight.len());
                in_flight.abort_all();
                while in_flight.join_next().await.is_some() {}
                break;
            }
        }
    }
}
