//! Per-trace payment state accumulating the legs of a two-leg order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{AssetId, TraceId, TransferId};
use super::instruction::StrategyKind;
use super::pair::PairSymbol;
use super::transfer::Transfer;

/// One funding transfer of a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    pub asset_id: AssetId,
    pub amount: Decimal,
    pub transfer_id: TransferId,
}

impl From<&Transfer> for Leg {
    fn from(transfer: &Transfer) -> Self {
        Self {
            asset_id: transfer.asset_id.clone(),
            amount: transfer.amount,
            transfer_id: transfer.transfer_id.clone(),
        }
    }
}

/// Reconciliation stage of a recorded payment. A trace ID with no record
/// has not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStage {
    /// Leg 1 recorded, leg 2 outstanding.
    AwaitingSecondLeg,
    /// Both legs recorded. Terminal.
    Complete,
}

/// Payment record keyed by trace ID.
///
/// Created on the first valid transfer for a trace ID, filled exactly once
/// with the second leg, and never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentState {
    /// Equal to the trace ID.
    pub order_id: TraceId,
    pub strategy: StrategyKind,
    pub pair_symbol: PairSymbol,
    /// Exchange names carried by the leg-1 memo.
    pub venues: Vec<String>,
    pub first: Leg,
    pub created_at: DateTime<Utc>,
    pub second: Option<Leg>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentState {
    /// Open a new payment from its first leg.
    #[must_use]
    pub fn open(
        trace_id: TraceId,
        strategy: StrategyKind,
        pair_symbol: PairSymbol,
        venues: Vec<String>,
        first: Leg,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id: trace_id,
            strategy,
            pair_symbol,
            venues,
            first,
            created_at: now,
            second: None,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.second.is_some()
    }

    #[must_use]
    pub fn stage(&self) -> PaymentStage {
        if self.is_complete() {
            PaymentStage::Complete
        } else {
            PaymentStage::AwaitingSecondLeg
        }
    }

    /// Whether the transfer has already been applied as one of the legs.
    #[must_use]
    pub fn records_transfer(&self, transfer_id: &TransferId) -> bool {
        &self.first.transfer_id == transfer_id
            || self
                .second
                .as_ref()
                .is_some_and(|leg| &leg.transfer_id == transfer_id)
    }

    /// Return a copy with the second leg filled.
    ///
    /// Returns `None` if the state is already complete.
    #[must_use]
    pub fn with_second_leg(&self, second: Leg, now: DateTime<Utc>) -> Option<Self> {
        if self.is_complete() {
            return None;
        }
        Some(Self {
            second: Some(second),
            updated_at: now,
            ..self.clone()
        })
    }
}
