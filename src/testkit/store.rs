//! Store wrapper with switchable write failures and slow payment access.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::adapter::outbound::memory::MemoryStore;
use crate::domain::{
    ArbitrageOrder, Leg, MarketMakingOrder, PaymentState, ProcessedTransfer, RefundRecord,
    StrategyOrder, TraceId, TransferId,
};
use crate::error::{Error, Result};
use crate::port::{OrderStore, PaymentStore, RefundStore, SnapshotLedger};

/// A [`MemoryStore`] whose writes fail with [`Error::Database`] while broken.
/// Reads always succeed.
///
/// With [`FailingStore::with_payment_delay`], payment state reads and writes
/// sleep first, so concurrent transfers interleave at every payment access,
/// and [`FailingStore::peak_payment_access`] reports the most accesses that
/// were ever in flight together.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    broken: AtomicBool,
    payment_delay: Option<Duration>,
    active_payment_access: AtomicUsize,
    peak_payment_access: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payment_delay(mut self, delay: Duration) -> Self {
        self.payment_delay = Some(delay);
        self
    }

    pub fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::SeqCst);
    }

    pub fn peak_payment_access(&self) -> usize {
        self.peak_payment_access.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn check(&self) -> Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(Error::Database("database is locked".into()));
        }
        Ok(())
    }

    async fn pause(&self) {
        let Some(delay) = self.payment_delay else {
            return;
        };
        let active = self.active_payment_access.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_payment_access.fetch_max(active, Ordering::SeqCst);
        tokio::time::sleep(delay).await;
        self.active_payment_access.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SnapshotLedger for FailingStore {
    async fn is_processed(&self, transfer_id: &TransferId) -> Result<bool> {
        self.inner.is_processed(transfer_id).await
    }

    async fn mark_processed(&self, marker: &ProcessedTransfer) -> Result<()> {
        self.check()?;
        self.inner.mark_processed(marker).await
    }
}

#[async_trait]
impl PaymentStore for FailingStore {
    async fn get_payment_state(&self, trace_id: &TraceId) -> Result<Option<PaymentState>> {
        self.pause().await;
        self.inner.get_payment_state(trace_id).await
    }

    async fn put_payment_state(&self, state: &PaymentState) -> Result<bool> {
        self.pause().await;
        self.check()?;
        self.inner.put_payment_state(state).await
    }

    async fn update_payment_state_leg2(
        &self,
        trace_id: &TraceId,
        leg: &Leg,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.pause().await;
        self.check()?;
        self.inner
            .update_payment_state_leg2(trace_id, leg, updated_at)
            .await
    }
}

#[async_trait]
impl OrderStore for FailingStore {
    async fn create_arbitrage_order(&self, order: &ArbitrageOrder) -> Result<bool> {
        self.check()?;
        self.inner.create_arbitrage_order(order).await
    }

    async fn create_market_making_order(&self, order: &MarketMakingOrder) -> Result<bool> {
        self.check()?;
        self.inner.create_market_making_order(order).await
    }

    async fn order_exists(&self, order_id: &TraceId) -> Result<bool> {
        self.inner.order_exists(order_id).await
    }

    async fn get_order(&self, order_id: &TraceId) -> Result<Option<StrategyOrder>> {
        self.inner.get_order(order_id).await
    }
}

#[async_trait]
impl RefundStore for FailingStore {
    async fn get_refund(&self, transfer_id: &TransferId) -> Result<Option<RefundRecord>> {
        self.inner.get_refund(transfer_id).await
    }

    async fn upsert_refund(&self, record: &RefundRecord) -> Result<()> {
        self.check()?;
        self.inner.upsert_refund(record).await
    }

    async fn list_retryable_refunds(
        &self,
        max_attempts: u32,
        limit: usize,
    ) -> Result<Vec<RefundRecord>> {
        self.inner.list_retryable_refunds(max_attempts, limit).await
    }

    async fn count_stuck_refunds(&self, max_attempts: u32) -> Result<usize> {
        self.inner.count_stuck_refunds(max_attempts).await
    }
}
