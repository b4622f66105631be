//! Scripted [`LedgerClient`] for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{Transfer, TxId};
use crate::error::{LedgerError, Result};
use crate::port::{LedgerClient, RefundRequest};

/// A ledger that serves queued batches and records refunds.
///
/// Each fetch pops the next queued batch (empty once exhausted). Failures are
/// injected by count. Refunds are deduplicated on their idempotency key the
/// way the real ledger does.
#[derive(Default)]
pub struct ScriptedLedger {
    batches: Mutex<VecDeque<Vec<Transfer>>>,
    fetch_failures: AtomicU32,
    refund_failures: AtomicU32,
    fetch_count: AtomicU32,
    next_tx: AtomicU64,
    fetch_delay: Option<Duration>,
    attempts: Mutex<Vec<RefundRequest>>,
    sent: Mutex<Vec<RefundRequest>>,
    tx_by_key: Mutex<HashMap<String, TxId>>,
}

impl ScriptedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every fetch.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub fn push_batch(&self, batch: Vec<Transfer>) {
        self.batches.lock().push_back(batch);
    }

    pub fn fail_next_fetches(&self, count: u32) {
        self.fetch_failures.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_refunds(&self, count: u32) {
        self.refund_failures.store(count, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Refunds the ledger accepted, one per idempotency key.
    pub fn refunds(&self) -> Vec<RefundRequest> {
        self.sent.lock().clone()
    }

    /// Every refund submission, including failed ones.
    pub fn refund_attempts(&self) -> Vec<RefundRequest> {
        self.attempts.lock().clone()
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl LedgerClient for ScriptedLedger {
    async fn fetch_incoming_transfers(&self) -> Result<Vec<Transfer>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        if Self::take_failure(&self.fetch_failures) {
            return Err(LedgerError::Fetch("scripted fetch failure".into()).into());
        }
        Ok(self.batches.lock().pop_front().unwrap_or_default())
    }

    async fn refund(&self, request: &RefundRequest) -> Result<TxId> {
        self.attempts.lock().push(request.clone());
        if Self::take_failure(&self.refund_failures) {
            return Err(LedgerError::Refund("scripted refund failure".into()).into());
        }

        let mut by_key = self.tx_by_key.lock();
        if let Some(tx) = by_key.get(&request.idempotency_key) {
            return Ok(tx.clone());
        }
        let n = self.next_tx.fetch_add(1, Ordering::SeqCst) + 1;
        let tx = TxId::new(format!("tx-{n}"));
        by_key.insert(request.idempotency_key.clone(), tx.clone());
        self.sent.lock().push(request.clone());
        Ok(tx)
    }
}
