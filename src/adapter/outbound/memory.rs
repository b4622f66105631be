//! In-memory store for tests and `--memory` runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::domain::{
    ArbitrageOrder, Disposition, Leg, MarketMakingOrder, PaymentState, ProcessedTransfer,
    RefundRecord, RefundStatus, StrategyOrder, TraceId, TransferId,
};
use crate::error::Result;
use crate::port::{OrderStore, PaymentStore, RefundStore, SnapshotLedger};

/// Non-durable store; every write is atomic under its map's lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    processed: RwLock<HashMap<TransferId, ProcessedTransfer>>,
    payments: RwLock<HashMap<TraceId, PaymentState>>,
    orders: RwLock<HashMap<TraceId, StrategyOrder>>,
    refunds: RwLock<HashMap<TransferId, RefundRecord>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Disposition recorded when the transfer was archived.
    #[must_use]
    pub fn disposition(&self, transfer_id: &TransferId) -> Option<Disposition> {
        self.processed.read().get(transfer_id).map(|m| m.disposition)
    }

    #[must_use]
    pub fn processed_count(&self) -> usize {
        self.processed.read().len()
    }

    #[must_use]
    pub fn order_count(&self) -> usize {
        self.orders.read().len()
    }

    #[must_use]
    pub fn refunds(&self) -> Vec<RefundRecord> {
        self.refunds.read().values().cloned().collect()
    }

    fn insert_order(&self, order: StrategyOrder) -> bool {
        let mut orders = self.orders.write();
        if orders.contains_key(order.order_id()) {
            return false;
        }
        orders.insert(order.order_id().clone(), order);
        true
    }
}

#[async_trait]
impl SnapshotLedger for MemoryStore {
    async fn is_processed(&self, transfer_id: &TransferId) -> Result<bool> {
        Ok(self.processed.read().contains_key(transfer_id))
    }

    async fn mark_processed(&self, marker: &ProcessedTransfer) -> Result<()> {
        self.processed
            .write()
            .entry(marker.transfer_id.clone())
            .or_insert_with(|| marker.clone());
        Ok(())
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn get_payment_state(&self, trace_id: &TraceId) -> Result<Option<PaymentState>> {
        Ok(self.payments.read().get(trace_id).cloned())
    }

    async fn put_payment_state(&self, state: &PaymentState) -> Result<bool> {
        let mut payments = self.payments.write();
        if payments.contains_key(&state.order_id) {
            return Ok(false);
        }
        payments.insert(state.order_id.clone(), state.clone());
        Ok(true)
    }

    async fn update_payment_state_leg2(
        &self,
        trace_id: &TraceId,
        leg: &Leg,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut payments = self.payments.write();
        match payments.get_mut(trace_id) {
            Some(state) if state.second.is_none() => {
                state.second = Some(leg.clone());
                state.updated_at = updated_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_arbitrage_order(&self, order: &ArbitrageOrder) -> Result<bool> {
        Ok(self.insert_order(StrategyOrder::Arbitrage(order.clone())))
    }

    async fn create_market_making_order(&self, order: &MarketMakingOrder) -> Result<bool> {
        Ok(self.insert_order(StrategyOrder::MarketMaking(order.clone())))
    }

    async fn order_exists(&self, order_id: &TraceId) -> Result<bool> {
        Ok(self.orders.read().contains_key(order_id))
    }

    async fn get_order(&self, order_id: &TraceId) -> Result<Option<StrategyOrder>> {
        Ok(self.orders.read().get(order_id).cloned())
    }
}

#[async_trait]
impl RefundStore for MemoryStore {
    async fn get_refund(&self, transfer_id: &TransferId) -> Result<Option<RefundRecord>> {
        Ok(self.refunds.read().get(transfer_id).cloned())
    }

    async fn upsert_refund(&self, record: &RefundRecord) -> Result<()> {
        self.refunds
            .write()
            .insert(record.transfer_id.clone(), record.clone());
        Ok(())
    }

    async fn list_retryable_refunds(
        &self,
        max_attempts: u32,
        limit: usize,
    ) -> Result<Vec<RefundRecord>> {
        let mut retryable: Vec<RefundRecord> = self
            .refunds
            .read()
            .values()
            .filter(|r| r.status != RefundStatus::Sent && r.attempts < max_attempts)
            .cloned()
            .collect();
        retryable.sort_by_key(|r| r.created_at);
        retryable.truncate(limit);
        Ok(retryable)
    }

    async fn count_stuck_refunds(&self, max_attempts: u32) -> Result<usize> {
        Ok(self
            .refunds
            .read()
            .values()
            .filter(|r| r.status == RefundStatus::Failed && r.attempts >= max_attempts)
            .count())
    }
}
