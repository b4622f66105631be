//! Durable refund records.
//!
//! Every refund is tracked by the transfer it returns, which makes refunds
//! idempotent across reprocessing and lets failed refunds be retried.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::{AssetId, TransferId, TxId, UserId};
use super::transfer::Transfer;

/// Why a transfer is being returned to its sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundReason {
    /// Asset is not part of the pair named in the memo.
    AssetMismatch,
    /// Memo names a pair the registry does not know.
    UnknownPair,
    /// Second leg does not fit the recorded first leg.
    LegMismatch,
    /// Payment for the trace ID is already complete.
    ExtraLeg,
}

impl RefundReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AssetMismatch => "asset_mismatch",
            Self::UnknownPair => "unknown_pair",
            Self::LegMismatch => "leg_mismatch",
            Self::ExtraLeg => "extra_leg",
        }
    }
}

impl fmt::Display for RefundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RefundReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asset_mismatch" => Ok(Self::AssetMismatch),
            "unknown_pair" => Ok(Self::UnknownPair),
            "leg_mismatch" => Ok(Self::LegMismatch),
            "extra_leg" => Ok(Self::ExtraLeg),
            other => Err(format!("unknown refund reason '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundStatus {
    Pending,
    Sent,
    Failed,
}

impl RefundStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for RefundStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown refund status '{other}'")),
        }
    }
}

/// A refund of one transfer's full amount to its sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRecord {
    pub transfer_id: TransferId,
    pub recipient_id: UserId,
    pub asset_id: AssetId,
    pub amount: Decimal,
    /// Deterministic key passed to the ledger so resubmissions are deduplicated.
    pub idempotency_key: String,
    pub reason: RefundReason,
    pub status: RefundStatus,
    pub attempts: u32,
    pub tx_id: Option<TxId>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RefundRecord {
    /// Start a pending refund for the full amount of `transfer`.
    #[must_use]
    pub fn pending(transfer: &Transfer, reason: RefundReason, now: DateTime<Utc>) -> Self {
        Self {
            transfer_id: transfer.transfer_id.clone(),
            recipient_id: transfer.sender_id.clone(),
            asset_id: transfer.asset_id.clone(),
            amount: transfer.amount,
            idempotency_key: refund_idempotency_key(&transfer.transfer_id),
            reason,
            status: RefundStatus::Pending,
            attempts: 0,
            tx_id: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.status == RefundStatus::Sent
    }

    pub fn mark_sent(&mut self, tx_id: TxId, now: DateTime<Utc>) {
        self.status = RefundStatus::Sent;
        self.attempts += 1;
        self.tx_id = Some(tx_id);
        self.last_error = None;
        self.updated_at = now;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>, now: DateTime<Utc>) {
        self.status = RefundStatus::Failed;
        self.attempts += 1;
        self.last_error = Some(error.into());
        self.updated_at = now;
    }
}

/// Derive the ledger idempotency key for refunding a transfer.
///
/// UUIDv5 over the transfer ID, so every attempt for the same transfer
/// carries the same key.
#[must_use]
pub fn refund_idempotency_key(transfer_id: &TransferId) -> String {
    let name = format!("refund:{transfer_id}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn transfer() -> Transfer {
        Transfer {
            transfer_id: TransferId::new("snap-9"),
            sender_id: UserId::new("alice"),
            asset_id: AssetId::new("eth"),
            amount: dec!(1.25),
            memo: String::new(),
            received_at: Utc::now(),
        }
    }

    #[test]
    fn pending_refund_returns_full_amount_to_sender() {
        let record = RefundRecord::pending(&transfer(), RefundReason::AssetMismatch, Utc::now());
        assert_eq!(record.recipient_id, UserId::new("alice"));
        assert_eq!(record.asset_id, AssetId::new("eth"));
        assert_eq!(record.amount, dec!(1.25));
        assert_eq!(record.status, RefundStatus::Pending);
        assert_eq!(record.attempts, 0);
    }

    #[test]
    fn idempotency_key_is_stable_per_transfer() {
        let a = refund_idempotency_key(&TransferId::new("snap-9"));
        let b = refund_idempotency_key(&TransferId::new("snap-9"));
        let c = refund_idempotency_key(&TransferId::new("snap-10"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn attempts_count_failures_and_success() {
        let mut record = RefundRecord::pending(&transfer(), RefundReason::ExtraLeg, Utc::now());
        record.mark_failed("timeout", Utc::now());
        assert_eq!(record.status, RefundStatus::Failed);
        assert_eq!(record.attempts, 1);

        record.mark_sent(TxId::new("tx-1"), Utc::now());
        assert!(record.is_sent());
        assert_eq!(record.attempts, 2);
        assert!(record.last_error.is_none());
    }
}
