//! Handlers for the `run` and `poll` commands.

use std::path::Path;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tracing::info;

use crate::adapter::inbound::cli::command::RunArgs;
use crate::adapter::inbound::cli::output;
use crate::application::CycleOutcome;
use crate::error::Result;
use crate::infrastructure::bootstrap::{
    build_ledger, build_notifier_registry, build_poller, build_store, StoreBackend,
};
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::orchestration::run_with_shutdown;

/// Poll until Ctrl-C.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let config = Config::load(&args.config)?;
    config.init_logging();

    let backend = if args.memory {
        StoreBackend::Memory
    } else {
        StoreBackend::Sqlite
    };
    print_startup(&args.config, &config, backend);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, finishing current cycle");
            let _ = shutdown_tx.send(true);
        }
    });

    run_with_shutdown(config, backend, shutdown_rx).await
}

/// Run one cycle against the configured database and print the report.
pub async fn execute_poll(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    config.init_logging();

    let store = build_store(&config, StoreBackend::Sqlite)?;
    let notifiers = Arc::new(build_notifier_registry());
    let poller = build_poller(&config, store, build_ledger(&config), notifiers)?;

    match poller.poll_once().await? {
        CycleOutcome::Completed(report) => {
            output::record("cycle", &report);
            output::section("Cycle");
            output::field("Fetched", report.fetched);
            output::field("Duplicates", report.duplicates);
            output::field("Seen before", report.skipped_processed);
            output::field("Ignored", report.ignored);
            output::field("Spot", report.spot_requested);
            output::field("Legs", report.legs_recorded);
            output::field("Orders", output::highlight(report.orders_created));
            output::field("Refunded", report.refunded);
            output::field("Replayed", report.replayed);
            if report.refund_failed > 0 {
                output::warning(&format!("{} refund(s) failed", report.refund_failed));
            }
            if report.refunds_stuck > 0 {
                output::warning(&format!(
                    "{} refund(s) exhausted their retries",
                    report.refunds_stuck
                ));
            }
            if report.failed > 0 {
                output::warning(&format!(
                    "{} transfer(s) left for the next cycle",
                    report.failed
                ));
            }
            output::success("Cycle complete");
        }
        CycleOutcome::Skipped => output::warning("Another cycle was in flight"),
    }
    Ok(())
}

fn print_startup(config_path: &Path, config: &Config, backend: StoreBackend) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Config", config_path.display());
    output::field("Ledger", &config.ledger.api_url);
    match backend {
        StoreBackend::Sqlite => output::field("Database", &config.database),
        StoreBackend::Memory => output::field("Database", output::muted("in-memory")),
    }
    output::field("Interval", format!("{}ms", config.poller.interval_ms));
    output::field("Concurrency", config.poller.max_concurrent_transfers);
    output::field("Pairs", config.pairs.len());
    if backend == StoreBackend::Memory {
        output::warning("State is not persisted; transfers may be processed again after restart");
    }
}
