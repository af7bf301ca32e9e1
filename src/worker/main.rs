use std::sync::Arc;

use anyhow::Context;
use tokio::signal;

use suite_runner::config::Config;
use suite_runner::services::{ScheduledJobs, Scheduler};
use suite_runner::state::AppState;
use suite_runner::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    telemetry::init(config.log_json);

    tracing::info!("Starting scheduler...");

    let cadences = config.scheduler_cadences.clone();
    if cadences.is_empty() {
        tracing::warn!("SCHEDULER_CADENCES is empty, no triggers will fire");
    }

    tracing::info!("Connecting to database...");
    let state = AppState::new(config)
        .await
        .context("Failed to initialize application state")?;
    tracing::info!("Database connection established");

    let jobs = Arc::new(ScheduledJobs::from_state(&state));
    let scheduler = Scheduler::start(jobs, &cadences);

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping scheduler...");
    scheduler.shutdown().await;

    tracing::info!("Scheduler shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
