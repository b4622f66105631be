//! Ledger port for snapshot intake and refunds.
//!
//! Transaction construction and signing live behind this boundary. The core
//! only pulls incoming transfers and asks for a refund transfer.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{AssetId, RefundRecord, Transfer, TxId, UserId};
use crate::error::Result;

/// A transfer returning funds to a sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundRequest {
    pub recipient_id: UserId,
    pub asset_id: AssetId,
    pub amount: Decimal,
    /// Stable per refunded transfer; the ledger deduplicates on it.
    pub idempotency_key: String,
    /// Free-text memo shown to the recipient.
    pub memo: String,
}

impl From<&RefundRecord> for RefundRequest {
    fn from(record: &RefundRecord) -> Self {
        Self {
            recipient_id: record.recipient_id.clone(),
            asset_id: record.asset_id.clone(),
            amount: record.amount,
            idempotency_key: record.idempotency_key.clone(),
            memo: format!("refund:{}", record.reason),
        }
    }
}

/// Client for the external ledger.
///
/// # Implementation Notes
///
/// - `fetch_incoming_transfers` may return transfers already seen; callers dedup.
/// - Both calls must be bounded by the client's own timeout.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Pull the most recent incoming transfers.
    async fn fetch_incoming_transfers(&self) -> Result<Vec<Transfer>>;

    /// Submit a refund. Best-effort; may fail.
    async fn refund(&self, request: &RefundRequest) -> Result<TxId>;
}
