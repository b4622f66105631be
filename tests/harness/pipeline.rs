use std::sync::Arc;

use snapsettle::adapter::outbound::memory::MemoryStore;
use snapsettle::application::{CycleOutcome, CycleReport, IntakePoller};
use snapsettle::domain::Transfer;
use snapsettle::infrastructure::bootstrap::build_poller;
use snapsettle::infrastructure::config::settings::Config;
use snapsettle::port::{NotifierRegistry, Store};
use snapsettle::testkit::config::config_with_pairs;
use snapsettle::testkit::ledger::ScriptedLedger;
use snapsettle::testkit::notifier::RecordingNotifier;

/// A poller wired exactly as in production, around a scripted ledger and a
/// recording notifier.
pub struct Harness<S> {
    pub poller: IntakePoller,
    pub store: Arc<S>,
    pub ledger: Arc<ScriptedLedger>,
    pub notifier: RecordingNotifier,
}

impl<S: Store + 'static> Harness<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::build(&config_with_pairs(), store, ScriptedLedger::new())
    }

    pub fn build(config: &Config, store: Arc<S>, ledger: ScriptedLedger) -> Self {
        let ledger = Arc::new(ledger);
        let notifier = RecordingNotifier::new();
        let mut registry = NotifierRegistry::new();
        registry.register(Box::new(notifier.clone()));

        let poller = build_poller(
            config,
            store.clone(),
            ledger.clone(),
            Arc::new(registry),
        )
        .expect("wire poller");

        Self {
            poller,
            store,
            ledger,
            notifier,
        }
    }

    /// Queue `batch` and run one cycle that must complete.
    pub async fn cycle(&self, batch: Vec<Transfer>) -> CycleReport {
        self.ledger.push_batch(batch);
        match self.poller.poll_once().await.expect("poll cycle") {
            CycleOutcome::Completed(report) => report,
            CycleOutcome::Skipped => panic!("cycle unexpectedly skipped"),
        }
    }
}

pub fn memory() -> Harness<MemoryStore> {
    Harness::new(Arc::new(MemoryStore::new()))
}
