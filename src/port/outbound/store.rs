//! Persistence ports for the reconciliation pipeline.
//!
//! The pipeline only needs a key-addressable store. Writes that guard
//! against double effects are conditional and report whether they applied.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    ArbitrageOrder, Leg, MarketMakingOrder, PaymentState, ProcessedTransfer, RefundRecord,
    StrategyOrder, TraceId, TransferId,
};
use crate::error::Result;

/// Idempotency ledger of processed transfers.
#[async_trait]
pub trait SnapshotLedger: Send + Sync {
    /// Whether the transfer has been fully handled.
    async fn is_processed(&self, transfer_id: &TransferId) -> Result<bool>;

    /// Record the transfer as processed. A second call for the same transfer
    /// keeps the first marker.
    async fn mark_processed(&self, marker: &ProcessedTransfer) -> Result<()>;
}

/// Storage for per-trace payment states.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn get_payment_state(&self, trace_id: &TraceId) -> Result<Option<PaymentState>>;

    /// Insert a new (leg-1) payment state.
    ///
    /// Returns `false` without writing if a state already exists for the trace ID.
    async fn put_payment_state(&self, state: &PaymentState) -> Result<bool>;

    /// Fill the second leg if, and only if, it is still unset.
    ///
    /// Returns `false` if the state is missing or already complete.
    async fn update_payment_state_leg2(
        &self,
        trace_id: &TraceId,
        leg: &Leg,
        updated_at: DateTime<Utc>,
    ) -> Result<bool>;
}

/// Storage for created strategy orders. Order IDs are unique.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Returns `false` without writing if an order with the same ID exists.
    async fn create_arbitrage_order(&self, order: &ArbitrageOrder) -> Result<bool>;

    /// Returns `false` without writing if an order with the same ID exists.
    async fn create_market_making_order(&self, order: &MarketMakingOrder) -> Result<bool>;

    async fn order_exists(&self, order_id: &TraceId) -> Result<bool>;

    async fn get_order(&self, order_id: &TraceId) -> Result<Option<StrategyOrder>>;
}

/// Storage for refund records keyed by the refunded transfer.
#[async_trait]
pub trait RefundStore: Send + Sync {
    async fn get_refund(&self, transfer_id: &TransferId) -> Result<Option<RefundRecord>>;

    /// Insert or replace the record for its transfer ID.
    async fn upsert_refund(&self, record: &RefundRecord) -> Result<()>;

    /// Pending or failed refunds with fewer than `max_attempts` attempts,
    /// oldest first.
    async fn list_retryable_refunds(
        &self,
        max_attempts: u32,
        limit: usize,
    ) -> Result<Vec<RefundRecord>>;

    /// Failed refunds that have exhausted `max_attempts`.
    async fn count_stuck_refunds(&self, max_attempts: u32) -> Result<usize>;
}

/// Everything the pipeline persists.
pub trait Store: SnapshotLedger + PaymentStore + OrderStore + RefundStore {}

impl<T> Store for T where T: SnapshotLedger + PaymentStore + OrderStore + RefundStore {}
