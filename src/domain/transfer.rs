//! Incoming ledger transfers ("snapshots").

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{AssetId, TransferId, UserId};

/// An observed incoming asset movement on the ledger.
///
/// Immutable once observed. The memo is the hex text attached to the
/// snapshot and may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub transfer_id: TransferId,
    pub sender_id: UserId,
    pub asset_id: AssetId,
    pub amount: Decimal,
    pub memo: String,
    pub received_at: DateTime<Utc>,
}

impl Transfer {
    /// Whether the transfer carries a memo at all.
    #[must_use]
    pub fn has_memo(&self) -> bool {
        !self.memo.is_empty()
    }

    /// Whether the amount credits us. Outgoing snapshots carry negative amounts.
    #[must_use]
    pub fn is_credit(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

/// How a transfer was finally handled. Recorded with its processed marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// No memo, no instruction, or not a credit.
    Ignored,
    SpotRequested,
    LegRecorded,
    OrderCreated,
    Refunded,
    /// Refund was attempted and failed; it stays queued for retry.
    RefundFailed,
    /// Already applied to a payment before an earlier crash; only archived now.
    Replayed,
}

impl Disposition {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::SpotRequested => "spot_requested",
            Self::LegRecorded => "leg_recorded",
            Self::OrderCreated => "order_created",
            Self::Refunded => "refunded",
            Self::RefundFailed => "refund_failed",
            Self::Replayed => "replayed",
        }
    }
}

impl std::str::FromStr for Disposition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ignored" => Ok(Self::Ignored),
            "spot_requested" => Ok(Self::SpotRequested),
            "leg_recorded" => Ok(Self::LegRecorded),
            "order_created" => Ok(Self::OrderCreated),
            "refunded" => Ok(Self::Refunded),
            "refund_failed" => Ok(Self::RefundFailed),
            "replayed" => Ok(Self::Replayed),
            other => Err(format!("unknown disposition '{other}'")),
        }
    }
}

/// Idempotency marker written once per transfer after all other effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedTransfer {
    pub transfer_id: TransferId,
    pub disposition: Disposition,
    pub processed_at: DateTime<Utc>,
}
