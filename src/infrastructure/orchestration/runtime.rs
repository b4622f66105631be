//! Runtime lifecycle: periodic poll cycles until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::application::{CycleOutcome, IntakePoller};
use crate::error::Result;
use crate::infrastructure::bootstrap::{
    build_ledger, build_notifier_registry, build_poller, build_store, StoreBackend,
};
use crate::infrastructure::config::settings::Config;

/// Build the pipeline from `config` and poll until `shutdown` flips to true.
///
/// # Errors
/// Returns an error only if startup wiring fails. Cycle failures are logged
/// and retried on the next tick.
pub async fn run_with_shutdown(
    config: Config,
    backend: StoreBackend,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    info!(
        ledger = %config.ledger.api_url,
        interval_ms = config.poller.interval_ms,
        concurrency = config.poller.max_concurrent_transfers,
        "Starting snapsettle"
    );

    let store = build_store(&config, backend)?;
    let notifiers = Arc::new(build_notifier_registry());
    let poller = build_poller(&config, store, build_ledger(&config), notifiers)?;

    drive(&poller, config.poller.interval(), shutdown).await;
    info!("Stopped");
    Ok(())
}

/// Run a poll cycle on every tick.
///
/// Shutdown is observed between cycles only; an in-flight cycle always
/// finishes. Ticks missed while a cycle runs are skipped.
pub async fn drive(poller: &IntakePoller, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            result = shutdown.changed() => {
                match result {
                    Ok(()) => {
                        if *shutdown.borrow() {
                            info!("Shutdown signal received");
                            break;
                        }
                    }
                    Err(_) => {
                        info!("Shutdown channel closed");
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                match poller.poll_once().await {
                    Ok(CycleOutcome::Completed(report)) => {
                        debug!(fetched = report.fetched, archived = report.archived(), "Cycle done");
                    }
                    Ok(CycleOutcome::Skipped) => {
                        debug!("Cycle skipped");
                    }
                    Err(e) => {
                        warn!(error = %e, "Poll cycle failed; retrying next tick");
                    }
                }
            }
        }
    }
}
