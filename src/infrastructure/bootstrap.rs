//! Composition root: builds the pipeline from configuration.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::ledger::HttpLedgerClient;
use crate::adapter::outbound::memory::MemoryStore;
use crate::adapter::outbound::sqlite::{create_pool, run_migrations, SqliteStore};
use crate::application::{
    IntakePipeline, IntakePoller, PaymentReconciler, RefundDecider, StrategyOrderFactory,
};
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::{LedgerClient, LogNotifier, NotifierRegistry, Store};

/// Where pipeline state is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// SQLite file at `config.database`.
    #[default]
    Sqlite,
    /// Process memory; everything is lost on exit.
    Memory,
}

/// Open the configured store, running migrations for SQLite.
///
/// # Errors
/// Returns an error if the database cannot be opened or migrated.
pub fn build_store(config: &Config, backend: StoreBackend) -> Result<Arc<dyn Store>> {
    match backend {
        StoreBackend::Sqlite => {
            let pool = create_pool(&config.database)?;
            run_migrations(&pool)?;
            info!(database = %config.database, "Database initialized");
            Ok(Arc::new(SqliteStore::new(pool)))
        }
        StoreBackend::Memory => {
            info!("Using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Build the ledger client from `[ledger]`.
#[must_use]
pub fn build_ledger(config: &Config) -> Arc<dyn LedgerClient> {
    Arc::new(HttpLedgerClient::from_config(&config.ledger))
}

/// Build the notifier registry. Events are logged.
#[must_use]
pub fn build_notifier_registry() -> NotifierRegistry {
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(LogNotifier));
    registry
}

/// Wire the intake poller around the given collaborators.
///
/// # Errors
/// Returns an error if the pair table is invalid.
pub fn build_poller(
    config: &Config,
    store: Arc<dyn Store>,
    ledger: Arc<dyn LedgerClient>,
    notifiers: Arc<NotifierRegistry>,
) -> Result<IntakePoller> {
    let pairs = Arc::new(config.pair_registry()?);
    info!(pairs = pairs.len(), "Pair registry loaded");

    let refunds = RefundDecider::new(
        Arc::clone(&store),
        Arc::clone(&ledger),
        pairs,
        Arc::clone(&notifiers),
    );
    let reconciler = PaymentReconciler::new(
        Arc::clone(&store),
        StrategyOrderFactory::new(config.execution.clone()),
        Arc::clone(&notifiers),
        config.poller.extra_leg_policy,
    );
    let pipeline = IntakePipeline::new(store, refunds, reconciler, Arc::clone(&notifiers));

    Ok(IntakePoller::new(
        ledger,
        Arc::new(pipeline),
        notifiers,
        config.poller.settings(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::config::config_with_pairs;

    #[test]
    fn memory_backend_builds_without_disk() {
        let config = config_with_pairs();
        assert!(build_store(&config, StoreBackend::Memory).is_ok());
    }

    #[test]
    fn sqlite_backend_migrates_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_with_pairs();
        config.database = dir.path().join("state.db").to_string_lossy().into_owned();

        assert!(build_store(&config, StoreBackend::Sqlite).is_ok());
        assert!(dir.path().join("state.db").exists());
    }

    #[test]
    fn notifier_registry_logs_events() {
        assert_eq!(build_notifier_registry().len(), 1);
    }
}
