//! Refund decisions and durable refund submission.
//!
//! A transfer whose asset is not part of the pair its memo names is returned
//! in full to its sender. Every refund is written to the refund ledger before
//! the ledger call, so a refund is never sent twice for the same transfer and
//! a failed refund stays queued for retry.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::domain::{AssetPair, PairSymbol, RefundReason, RefundRecord, Transfer, TxId};
use crate::error::Result;
use crate::port::{Event, LedgerClient, NotifierRegistry, PairRegistry, RefundRequest, Store};

/// Result of validating a transfer's asset against its instruction's pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetCheck {
    Valid(AssetPair),
    Invalid(RefundReason),
}

/// Result of a refund attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefundOutcome {
    Sent(TxId),
    /// An earlier attempt already succeeded; nothing was resubmitted.
    AlreadySent,
    /// Submission failed; the record stays retryable.
    Failed,
}

/// Counters from one retry pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetrySummary {
    pub retried: usize,
    pub sent: usize,
    pub failed: usize,
    /// Failed refunds past the retry limit, waiting for manual intervention.
    pub stuck: usize,
}

/// Validates transfer assets against the pair registry and returns funds to
/// senders through the ledger, persisting each refund before it is sent.
pub struct RefundDecider {
    store: Arc<dyn Store>,
    ledger: Arc<dyn LedgerClient>,
    pairs: Arc<dyn PairRegistry>,
    notifiers: Arc<NotifierRegistry>,
}

impl RefundDecider {
    /// Create a decider over the given store, ledger and pair registry.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        ledger: Arc<dyn LedgerClient>,
        pairs: Arc<dyn PairRegistry>,
        notifiers: Arc<NotifierRegistry>,
    ) -> Self {
        Self {
            store,
            ledger,
            pairs,
            notifiers,
        }
    }

    /// Check that the transfer's asset is one side of `symbol`.
    #[must_use]
    pub fn check_asset(&self, transfer: &Transfer, symbol: &PairSymbol) -> AssetCheck {
        match self.pairs.resolve(symbol) {
            Ok(pair) if pair.contains(&transfer.asset_id) => AssetCheck::Valid(pair),
            Ok(_) => {
                info!(
                    transfer_id = %transfer.transfer_id,
                    asset_id = %transfer.asset_id,
                    pair = %symbol,
                    "Asset does not belong to pair"
                );
                AssetCheck::Invalid(RefundReason::AssetMismatch)
            }
            Err(e) => {
                warn!(transfer_id = %transfer.transfer_id, error = %e, "Pair lookup failed");
                AssetCheck::Invalid(RefundReason::UnknownPair)
            }
        }
    }

    /// Refund the full amount of `transfer` to its sender.
    ///
    /// # Errors
    /// Only store failures are returned. Ledger failures are recorded on the
    /// refund and reported as [`RefundOutcome::Failed`].
    pub async fn refund(&self, transfer: &Transfer, reason: RefundReason) -> Result<RefundOutcome> {
        let existing = self.store.get_refund(&transfer.transfer_id).await?;
        if existing.as_ref().is_some_and(RefundRecord::is_sent) {
            info!(transfer_id = %transfer.transfer_id, "Refund already sent");
            return Ok(RefundOutcome::AlreadySent);
        }

        let record =
            existing.unwrap_or_else(|| RefundRecord::pending(transfer, reason, Utc::now()));
        self.store.upsert_refund(&record).await?;
        self.submit(record).await
    }

    /// Resubmit pending or failed refunds below the attempt limit.
    ///
    /// # Errors
    /// Returns store failures; the caller treats them as a cycle failure.
    pub async fn retry_failed(&self, max_attempts: u32, batch: usize) -> Result<RetrySummary> {
        let mut summary = RetrySummary::default();
        for record in self.store.list_retryable_refunds(max_attempts, batch).await? {
            summary.retried += 1;
            match self.submit(record).await? {
                RefundOutcome::Sent(_) | RefundOutcome::AlreadySent => summary.sent += 1,
                RefundOutcome::Failed => summary.failed += 1,
            }
        }

        summary.stuck = self.store.count_stuck_refunds(max_attempts).await?;
        if summary.stuck > 0 {
            error!(
                stuck = summary.stuck,
                max_attempts, "Refunds exhausted their retries and need manual intervention"
            );
        }
        Ok(summary)
    }

    async fn submit(&self, mut record: RefundRecord) -> Result<RefundOutcome> {
        let request = RefundRequest::from(&record);
        match self.ledger.refund(&request).await {
            Ok(tx_id) => {
                record.mark_sent(tx_id.clone(), Utc::now());
                self.store.upsert_refund(&record).await?;
                info!(
                    transfer_id = %record.transfer_id,
                    recipient = %record.recipient_id,
                    asset_id = %record.asset_id,
                    amount = %record.amount,
                    reason = %record.reason,
                    tx_id = %tx_id,
                    "Refund sent"
                );
                self.notifiers
                    .notify_all(Event::RefundIssued((&record).into()));
                Ok(RefundOutcome::Sent(tx_id))
            }
            Err(e) => {
                record.mark_failed(e.to_string(), Utc::now());
                self.store.upsert_refund(&record).await?;
                error!(
                    transfer_id = %record.transfer_id,
                    recipient = %record.recipient_id,
                    asset_id = %record.asset_id,
                    amount = %record.amount,
                    attempts = record.attempts,
                    error = %e,
                    "Refund submission failed"
                );
                self.notifiers
                    .notify_all(Event::RefundFailed((&record).into()));
                Ok(RefundOutcome::Failed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::memory::MemoryStore;
    use crate::domain::{AssetId, RefundStatus};
    use crate::port::RefundStore;
    use crate::testkit::fixtures::{btc_usdt_registry, transfer};
    use crate::testkit::ledger::ScriptedLedger;
    use crate::testkit::notifier::RecordingNotifier;
    use rust_decimal_macros::dec;

    struct Setup {
        decider: RefundDecider,
        store: Arc<MemoryStore>,
        ledger: Arc<ScriptedLedger>,
        notifier: RecordingNotifier,
    }

    fn setup() -> Setup {
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(ScriptedLedger::new());
        let notifier = RecordingNotifier::new();
        let mut registry = NotifierRegistry::new();
        registry.register(Box::new(notifier.clone()));
        let decider = RefundDecider::new(
            store.clone(),
            ledger.clone(),
            Arc::new(btc_usdt_registry()),
            Arc::new(registry),
        );
        Setup {
            decider,
            store,
            ledger,
            notifier,
        }
    }

    fn symbol(s: &str) -> PairSymbol {
        PairSymbol::parse(s).unwrap()
    }

    #[test]
    fn check_asset_accepts_either_side() {
        let s = setup();
        let btc = transfer("1", "alice", "btc", dec!(0.1), "");
        let usdt = transfer("2", "alice", "usdt", dec!(10), "");
        assert!(matches!(
            s.decider.check_asset(&btc, &symbol("BTC/USDT")),
            AssetCheck::Valid(_)
        ));
        assert!(matches!(
            s.decider.check_asset(&usdt, &symbol("BTC/USDT")),
            AssetCheck::Valid(_)
        ));
    }

    #[test]
    fn check_asset_flags_mismatch_and_unknown_pair() {
        let s = setup();
        let eth = transfer("1", "alice", "eth", dec!(1), "");
        assert_eq!(
            s.decider.check_asset(&eth, &symbol("BTC/USDT")),
            AssetCheck::Invalid(RefundReason::AssetMismatch)
        );
        assert_eq!(
            s.decider.check_asset(&eth, &symbol("DOGE/USDT")),
            AssetCheck::Invalid(RefundReason::UnknownPair)
        );
    }

    #[tokio::test]
    async fn refund_returns_full_amount_to_sender() {
        let s = setup();
        let eth = transfer("1", "alice", "eth", dec!(1.5), "");

        let outcome = s
            .decider
            .refund(&eth, RefundReason::AssetMismatch)
            .await
            .unwrap();

        assert!(matches!(outcome, RefundOutcome::Sent(_)));
        let sent = s.ledger.refunds();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient_id.as_str(), "alice");
        assert_eq!(sent[0].asset_id, AssetId::new("eth"));
        assert_eq!(sent[0].amount, dec!(1.5));

        let record = s.store.get_refund(&eth.transfer_id).await.unwrap().unwrap();
        assert_eq!(record.status, RefundStatus::Sent);
        assert_eq!(s.notifier.refunds_issued(), 1);
    }

    #[tokio::test]
    async fn second_refund_of_same_transfer_is_not_resent() {
        let s = setup();
        let eth = transfer("1", "alice", "eth", dec!(1.5), "");

        s.decider.refund(&eth, RefundReason::AssetMismatch).await.unwrap();
        let again = s.decider.refund(&eth, RefundReason::AssetMismatch).await.unwrap();

        assert_eq!(again, RefundOutcome::AlreadySent);
        assert_eq!(s.ledger.refunds().len(), 1);
    }

    #[tokio::test]
    async fn failed_refund_is_recorded_and_retried() {
        let s = setup();
        s.ledger.fail_next_refunds(1);
        let eth = transfer("1", "alice", "eth", dec!(1.5), "");

        let outcome = s.decider.refund(&eth, RefundReason::AssetMismatch).await.unwrap();
        assert_eq!(outcome, RefundOutcome::Failed);
        assert_eq!(s.notifier.refunds_failed(), 1);

        let record = s.store.get_refund(&eth.transfer_id).await.unwrap().unwrap();
        assert_eq!(record.status, RefundStatus::Failed);
        assert_eq!(record.attempts, 1);

        let summary = s.decider.retry_failed(5, 10).await.unwrap();
        assert_eq!(summary.retried, 1);
        assert_eq!(summary.sent, 1);
        assert_eq!(summary.stuck, 0);

        let record = s.store.get_refund(&eth.transfer_id).await.unwrap().unwrap();
        assert_eq!(record.status, RefundStatus::Sent);
        assert_eq!(record.attempts, 2);
    }

    #[tokio::test]
    async fn refunds_past_the_limit_are_reported_stuck() {
        let s = setup();
        s.ledger.fail_next_refunds(10);
        let eth = transfer("1", "alice", "eth", dec!(1.5), "");

        s.decider.refund(&eth, RefundReason::AssetMismatch).await.unwrap();
        let first = s.decider.retry_failed(2, 10).await.unwrap();
        assert_eq!(first.retried, 1);
        assert_eq!(first.failed, 1);
        assert_eq!(first.stuck, 1);

        let second = s.decider.retry_failed(2, 10).await.unwrap();
        assert_eq!(second.retried, 0);
        assert_eq!(second.stuck, 1);
    }

    #[tokio::test]
    async fn retries_reuse_the_idempotency_key() {
        let s = setup();
        s.ledger.fail_next_refunds(1);
        let eth = transfer("1", "alice", "eth", dec!(1.5), "");

        s.decider.refund(&eth, RefundReason::AssetMismatch).await.unwrap();
        s.decider.retry_failed(5, 10).await.unwrap();

        let attempts = s.ledger.refund_attempts();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].idempotency_key, attempts[1].idempotency_key);
    }
}
