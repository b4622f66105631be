//! Per-transfer intake: dedup check, memo decode, dispatch, archive.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::domain::{
    memo, Disposition, Instruction, ProcessedTransfer, RefundReason, SpotInstruction, Transfer,
};
use crate::error::Result;
use crate::port::{Event, NotifierRegistry, SpotRequestEvent, Store};

use super::reconcile::{PaymentReconciler, StepOutcome};
use super::refund::{AssetCheck, RefundDecider, RefundOutcome};
use super::trace_lock::TraceLocks;

/// Outcome of offering one transfer to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Archived in an earlier cycle; nothing was done.
    AlreadyProcessed,
    /// Handled and archived now.
    Handled(Disposition),
}

/// Handles individual transfers. Safe to call concurrently for different
/// transfers; transfers sharing a trace ID are serialized internally.
pub struct IntakePipeline {
    store: Arc<dyn Store>,
    refunds: RefundDecider,
    reconciler: PaymentReconciler,
    notifiers: Arc<NotifierRegistry>,
    locks: TraceLocks,
}

impl IntakePipeline {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        refunds: RefundDecider,
        reconciler: PaymentReconciler,
        notifiers: Arc<NotifierRegistry>,
    ) -> Self {
        Self {
            store,
            refunds,
            reconciler,
            notifiers,
            locks: TraceLocks::new(),
        }
    }

    #[must_use]
    pub fn refunds(&self) -> &RefundDecider {
        &self.refunds
    }

    #[must_use]
    pub fn locks(&self) -> &TraceLocks {
        &self.locks
    }

    /// Process one transfer and archive it.
    ///
    /// The processed marker is written last, after every other effect, so a
    /// failure at any earlier point leaves the transfer to be retried.
    ///
    /// # Errors
    /// Returns store failures and inconsistent stored state. The transfer is
    /// not archived in that case.
    pub async fn process(&self, transfer: &Transfer) -> Result<TransferOutcome> {
        if self.store.is_processed(&transfer.transfer_id).await? {
            debug!(transfer_id = %transfer.transfer_id, "Transfer already processed");
            return Ok(TransferOutcome::AlreadyProcessed);
        }

        let disposition = self.handle(transfer).await?;

        self.store
            .mark_processed(&ProcessedTransfer {
                transfer_id: transfer.transfer_id.clone(),
                disposition,
                processed_at: Utc::now(),
            })
            .await?;
        debug!(
            transfer_id = %transfer.transfer_id,
            disposition = disposition.as_str(),
            "Transfer archived"
        );
        Ok(TransferOutcome::Handled(disposition))
    }

    async fn handle(&self, transfer: &Transfer) -> Result<Disposition> {
        if !transfer.is_credit() {
            debug!(
                transfer_id = %transfer.transfer_id,
                amount = %transfer.amount,
                "Not a credit; archiving"
            );
            return Ok(Disposition::Ignored);
        }
        if !transfer.has_memo() {
            debug!(transfer_id = %transfer.transfer_id, "No memo; archiving");
            return Ok(Disposition::Ignored);
        }

        let instruction = match memo::try_decode(&transfer.memo) {
            Ok(instruction) => instruction,
            Err(e) => {
                debug!(
                    transfer_id = %transfer.transfer_id,
                    error = %e,
                    "Memo carries no instruction"
                );
                return Ok(Disposition::Ignored);
            }
        };

        match &instruction {
            Instruction::Spot(spot) => self.handle_spot(transfer, spot).await,
            Instruction::Arbitrage(_) | Instruction::MarketMaking(_) => {
                self.handle_two_leg(transfer, &instruction).await
            }
        }
    }

    async fn handle_spot(
        &self,
        transfer: &Transfer,
        spot: &SpotInstruction,
    ) -> Result<Disposition> {
        if let AssetCheck::Invalid(reason) = self.refunds.check_asset(transfer, &spot.symbol) {
            return self.refund(transfer, reason).await;
        }

        info!(
            transfer_id = %transfer.transfer_id,
            trace_id = %spot.trace_id,
            pair = %spot.symbol,
            exchange = %spot.exchange,
            side = spot.side.as_str(),
            amount = %transfer.amount,
            "Spot order requested"
        );
        self.notifiers
            .notify_all(Event::SpotOrderRequested(SpotRequestEvent {
                transfer_id: transfer.transfer_id.clone(),
                sender_id: transfer.sender_id.clone(),
                asset_id: transfer.asset_id.clone(),
                amount: transfer.amount,
                instruction: spot.clone(),
            }));
        Ok(Disposition::SpotRequested)
    }

    async fn handle_two_leg(
        &self,
        transfer: &Transfer,
        instruction: &Instruction,
    ) -> Result<Disposition> {
        let pair = match self.refunds.check_asset(transfer, instruction.symbol()) {
            AssetCheck::Valid(pair) => pair,
            AssetCheck::Invalid(reason) => return self.refund(transfer, reason).await,
        };

        let _guard = self.locks.acquire(instruction.trace_id()).await;
        match self.reconciler.step(transfer, instruction, &pair).await? {
            StepOutcome::LegRecorded => Ok(Disposition::LegRecorded),
            StepOutcome::OrderCreated(_) => Ok(Disposition::OrderCreated),
            StepOutcome::Replayed => Ok(Disposition::Replayed),
            StepOutcome::Ignored => Ok(Disposition::Ignored),
            StepOutcome::Rejected(reason) => self.refund(transfer, reason).await,
        }
    }

    async fn refund(&self, transfer: &Transfer, reason: RefundReason) -> Result<Disposition> {
        match self.refunds.refund(transfer, reason).await? {
            RefundOutcome::Sent(_) | RefundOutcome::AlreadySent => Ok(Disposition::Refunded),
            RefundOutcome::Failed => Ok(Disposition::RefundFailed),
        }
    }
}
