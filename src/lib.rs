pub mod cli;
pub mod config;
mod db;
pub mod error;
pub mod geo;
pub mod location;
pub mod models;
pub mod reporter;
pub mod store;
pub mod ui;
mod utils;
pub mod viewer;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::sync::Arc;

use cli::{Cli, Role};
use config::PresenceConfig;
use reporter::{ReporterContext, ReporterController};
use ui::ConsoleSurface;
use viewer::ViewerController;

pub fn run() -> Result<()> {
    utils::logging::init();

    let cli = Cli::parse();
    let config = PresenceConfig::load(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;

    info!("Office presence starting up as {:?}...", cli.role);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("presence-worker")
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(run_role(cli.role, config))
}

async fn run_role(role: Role, config: PresenceConfig) -> Result<()> {
    let store = store::open(&config.store)?;

    let mut reporter = ReporterController::new();
    let mut viewer = ViewerController::new();

    if role.runs_reporter() {
        let ctx = ReporterContext::new(
            config.reporter_settings(),
            location::provider_for(&config.location_source),
            store.clone(),
            Arc::new(ConsoleSurface::new("reporter")),
        );
        reporter.start(ctx)?;
    }

    if role.runs_viewer() {
        viewer.start(
            store.clone(),
            config.viewer_settings(),
            Arc::new(ConsoleSurface::new("viewer")),
        )?;
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Shutdown requested");

    let viewer_stopped = viewer.stop().await;
    let reporter_stopped = reporter.stop().await;
    combine_stop_results(viewer_stopped, reporter_stopped)
}

/// Both roles are always stopped; their failures are reported together.
fn combine_stop_results(viewer: Result<()>, reporter: Result<()>) -> Result<()> {
    match (viewer, reporter) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(err), Ok(())) => Err(err.context("failed to stop viewer")),
        (Ok(()), Err(err)) => Err(err.context("failed to stop reporter")),
        (Err(viewer_err), Err(reporter_err)) => Err(anyhow::anyhow!(
            "failed to stop viewer ({viewer_err:#}) and reporter ({reporter_err:#})"
        )),
    }
}
