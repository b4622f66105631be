//! Intake poller: one reconciliation cycle over the latest ledger snapshots.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::domain::{Disposition, Transfer, TransferId};
use crate::error::{Error, LedgerError, Result};
use crate::port::{CycleEvent, Event, LedgerClient, NotifierRegistry};

use super::intake::{IntakePipeline, TransferOutcome};

/// Tuning for a poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerSettings {
    /// Transfers processed concurrently within a cycle.
    pub max_concurrent_transfers: usize,
    /// Submission attempts before a refund is reported stuck.
    pub refund_retry_limit: u32,
    /// Refunds retried at the start of each cycle.
    pub refund_retry_batch: usize,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            max_concurrent_transfers: num_cpus::get().max(1),
            refund_retry_limit: 5,
            refund_retry_batch: 50,
        }
    }
}

/// Counters for one completed cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub fetched: usize,
    /// Repeated transfer IDs dropped from the batch.
    pub duplicates: usize,
    /// Archived in an earlier cycle.
    pub skipped_processed: usize,
    pub ignored: usize,
    pub spot_requested: usize,
    pub legs_recorded: usize,
    pub orders_created: usize,
    pub refunded: usize,
    pub refund_failed: usize,
    pub replayed: usize,
    /// Left unarchived for the next cycle.
    pub failed: usize,
    pub refunds_retried: usize,
    pub refunds_stuck: usize,
}

impl CycleReport {
    fn record(&mut self, disposition: Disposition) {
        match disposition {
            Disposition::Ignored => self.ignored += 1,
            Disposition::SpotRequested => self.spot_requested += 1,
            Disposition::LegRecorded => self.legs_recorded += 1,
            Disposition::OrderCreated => self.orders_created += 1,
            Disposition::Refunded => self.refunded += 1,
            Disposition::RefundFailed => self.refund_failed += 1,
            Disposition::Replayed => self.replayed += 1,
        }
    }

    /// Transfers archived during this cycle.
    #[must_use]
    pub fn archived(&self) -> usize {
        self.ignored
            + self.spot_requested
            + self.legs_recorded
            + self.orders_created
            + self.refunded
            + self.refund_failed
            + self.replayed
    }
}

impl From<&CycleReport> for CycleEvent {
    fn from(report: &CycleReport) -> Self {
        Self {
            fetched: report.fetched,
            orders_created: report.orders_created,
            refunded: report.refunded,
            refund_failed: report.refund_failed,
            failed: report.failed,
            refunds_stuck: report.refunds_stuck,
        }
    }
}

/// Result of [`IntakePoller::poll_once`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// A cycle was already in flight; this tick was dropped.
    Skipped,
}

enum Processed {
    Outcome(TransferOutcome),
    Failed,
    /// Not started because the cycle was aborting.
    Deferred,
}

/// Runs poll cycles: fetch a snapshot page, process it with bounded
/// concurrency, then retry failed refunds. At most one cycle runs at a time.
pub struct IntakePoller {
    ledger: Arc<dyn LedgerClient>,
    pipeline: Arc<IntakePipeline>,
    notifiers: Arc<NotifierRegistry>,
    settings: PollerSettings,
    in_flight: AtomicBool,
}

impl IntakePoller {
    /// Create an idle poller.
    #[must_use]
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        pipeline: Arc<IntakePipeline>,
        notifiers: Arc<NotifierRegistry>,
        settings: PollerSettings,
    ) -> Self {
        Self {
            ledger,
            pipeline,
            notifiers,
            settings,
            in_flight: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn pipeline(&self) -> &IntakePipeline {
        &self.pipeline
    }

    /// Run one cycle unless another is still in flight.
    ///
    /// # Errors
    /// Returns [`LedgerError::Fetch`] when snapshots cannot be pulled, store
    /// failures from the refund retry pass, and [`Error::CycleAborted`] when a
    /// store failure stopped the batch early. Unarchived transfers are picked
    /// up again next cycle.
    pub async fn poll_once(&self) -> Result<CycleOutcome> {
        let Some(_guard) = InFlight::enter(&self.in_flight) else {
            debug!("Poll cycle still in flight; skipping tick");
            return Ok(CycleOutcome::Skipped);
        };

        let result = self.run_cycle().await;
        self.pipeline.locks().prune();
        result.map(CycleOutcome::Completed)
    }

    async fn run_cycle(&self) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        let retry = self
            .pipeline
            .refunds()
            .retry_failed(
                self.settings.refund_retry_limit,
                self.settings.refund_retry_batch,
            )
            .await?;
        report.refunds_retried = retry.retried;
        report.refunds_stuck = retry.stuck;

        let transfers = self
            .ledger
            .fetch_incoming_transfers()
            .await
            .map_err(|e| match e {
                Error::Ledger(_) => e,
                other => LedgerError::Fetch(other.to_string()).into(),
            })?;
        report.fetched = transfers.len();

        let (batch, duplicates) = dedup_batch(transfers);
        report.duplicates = duplicates;
        if duplicates > 0 {
            debug!(duplicates, "Dropped repeated transfers from batch");
        }

        let abort = AtomicBool::new(false);
        let results: Vec<Processed> = stream::iter(batch)
            .map(|transfer| {
                let abort = &abort;
                let pipeline = &self.pipeline;
                async move {
                    if abort.load(Ordering::SeqCst) {
                        return Processed::Deferred;
                    }
                    match pipeline.process(&transfer).await {
                        Ok(outcome) => Processed::Outcome(outcome),
                        Err(e) => {
                            if e.is_infrastructure() {
                                abort.store(true, Ordering::SeqCst);
                            }
                            error!(
                                transfer_id = %transfer.transfer_id,
                                error = %e,
                                "Transfer processing failed; will retry next cycle"
                            );
                            Processed::Failed
                        }
                    }
                }
            })
            .buffer_unordered(self.settings.max_concurrent_transfers.max(1))
            .collect()
            .await;

        let mut deferred = 0;
        for processed in results {
            match processed {
                Processed::Outcome(TransferOutcome::AlreadyProcessed) => {
                    report.skipped_processed += 1;
                }
                Processed::Outcome(TransferOutcome::Handled(disposition)) => {
                    report.record(disposition);
                }
                Processed::Failed => report.failed += 1,
                Processed::Deferred => deferred += 1,
            }
        }

        if abort.load(Ordering::SeqCst) {
            warn!(
                failed = report.failed,
                deferred,
                archived = report.archived(),
                "Poll cycle aborted on store failure"
            );
            return Err(Error::CycleAborted {
                failed: report.failed,
            });
        }

        info!(
            fetched = report.fetched,
            archived = report.archived(),
            orders = report.orders_created,
            refunded = report.refunded,
            failed = report.failed,
            "Poll cycle finished"
        );
        self.notifiers
            .notify_all(Event::CycleCompleted((&report).into()));
        Ok(report)
    }
}

/// Drop repeated transfer IDs, keeping the first occurrence.
fn dedup_batch(transfers: Vec<Transfer>) -> (Vec<Transfer>, usize) {
    let mut seen: HashSet<TransferId> = HashSet::with_capacity(transfers.len());
    let total = transfers.len();
    let unique: Vec<Transfer> = transfers
        .into_iter()
        .filter(|t| seen.insert(t.transfer_id.clone()))
        .collect();
    let duplicates = total - unique.len();
    (unique, duplicates)
}

/// Clears the in-flight flag on drop, including when the cycle future is cancelled.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
