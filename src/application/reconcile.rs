//! Two-leg payment reconciliation.
//!
//! Drives a trace ID's [`PaymentState`] from no record through
//! [`PaymentStage::AwaitingSecondLeg`] to [`PaymentStage::Complete`]. Callers must hold the trace lock
//! for the instruction's trace ID while calling [`PaymentReconciler::step`].

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::{
    AssetPair, Instruction, Leg, PaymentStage, PaymentState, RefundReason, StrategyOrder, Transfer,
};
use crate::error::{Error, Result};
use crate::port::{Event, NotifierRegistry, Store};

use super::order_factory::StrategyOrderFactory;

/// What to do with a transfer whose trace ID is already complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtraLegPolicy {
    /// Return the funds to the sender.
    #[default]
    Refund,
    /// Archive without moving funds.
    Ignore,
}

/// Result of applying one transfer to its payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The transfer opened the payment as its first leg.
    LegRecorded,
    /// The transfer completed the payment and this order was persisted.
    OrderCreated(StrategyOrder),
    /// The transfer was already applied; nothing changed.
    Replayed,
    /// Extra leg under [`ExtraLegPolicy::Ignore`].
    Ignored,
    /// The transfer cannot join the payment and must be refunded.
    Rejected(RefundReason),
}

/// Applies two-leg transfers to their payment state and creates the
/// strategy order once both legs are in.
pub struct PaymentReconciler {
    store: Arc<dyn Store>,
    factory: StrategyOrderFactory,
    notifiers: Arc<NotifierRegistry>,
    extra_leg_policy: ExtraLegPolicy,
}

impl PaymentReconciler {
    /// Create a reconciler writing to `store`. `extra_leg_policy` decides
    /// what happens to transfers arriving after completion.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        factory: StrategyOrderFactory,
        notifiers: Arc<NotifierRegistry>,
        extra_leg_policy: ExtraLegPolicy,
    ) -> Self {
        Self {
            store,
            factory,
            notifiers,
            extra_leg_policy,
        }
    }

    /// Apply `transfer` to the payment named by `instruction`.
    ///
    /// `pair` must already be validated to contain the transfer's asset.
    ///
    /// # Errors
    /// Returns store failures and [`Error::Inconsistent`] when stored records
    /// contradict each other.
    pub async fn step(
        &self,
        transfer: &Transfer,
        instruction: &Instruction,
        pair: &AssetPair,
    ) -> Result<StepOutcome> {
        let trace_id = instruction.trace_id();
        match self.store.get_payment_state(trace_id).await? {
            None => self.open(transfer, instruction, pair).await,
            Some(state) => self.advance(state, transfer, instruction, pair).await,
        }
    }

    async fn open(
        &self,
        transfer: &Transfer,
        instruction: &Instruction,
        pair: &AssetPair,
    ) -> Result<StepOutcome> {
        let trace_id = instruction.trace_id();
        let state = PaymentState::open(
            trace_id.clone(),
            instruction.kind(),
            instruction.symbol().clone(),
            instruction.venues(),
            Leg::from(transfer),
            Utc::now(),
        );

        if self.store.put_payment_state(&state).await? {
            info!(
                trace_id = %trace_id,
                transfer_id = %transfer.transfer_id,
                strategy = %state.strategy,
                pair = %state.pair_symbol,
                asset_id = %transfer.asset_id,
                amount = %transfer.amount,
                "Recorded first leg"
            );
            return Ok(StepOutcome::LegRecorded);
        }

        // Another writer opened the payment between our read and insert.
        let current = self.reload(instruction).await?;
        self.advance(current, transfer, instruction, pair).await
    }

    async fn advance(
        &self,
        state: PaymentState,
        transfer: &Transfer,
        instruction: &Instruction,
        pair: &AssetPair,
    ) -> Result<StepOutcome> {
        if state.records_transfer(&transfer.transfer_id) {
            return self.replay(&state, transfer).await;
        }
        match state.stage() {
            PaymentStage::Complete => Ok(self.extra_leg(&state, transfer)),
            PaymentStage::AwaitingSecondLeg => {
                self.fill_second_leg(state, transfer, instruction, pair).await
            }
        }
    }

    async fn fill_second_leg(
        &self,
        state: PaymentState,
        transfer: &Transfer,
        instruction: &Instruction,
        pair: &AssetPair,
    ) -> Result<StepOutcome> {
        if let Some(reason) = mismatch(&state, transfer, instruction, pair) {
            info!(
                trace_id = %state.order_id,
                transfer_id = %transfer.transfer_id,
                reason,
                "Second leg does not match first leg"
            );
            return Ok(StepOutcome::Rejected(RefundReason::LegMismatch));
        }

        let now = Utc::now();
        let leg = Leg::from(transfer);
        if !self
            .store
            .update_payment_state_leg2(&state.order_id, &leg, now)
            .await?
        {
            // Completed by another writer since we read it.
            let current = self.reload(instruction).await?;
            if current.records_transfer(&transfer.transfer_id) {
                return self.replay(&current, transfer).await;
            }
            return match current.stage() {
                PaymentStage::Complete => Ok(self.extra_leg(&current, transfer)),
                PaymentStage::AwaitingSecondLeg => Err(Error::Inconsistent(format!(
                    "leg-2 update for trace {} was not applied",
                    state.order_id
                ))),
            };
        }

        let Some(completed) = state.with_second_leg(leg, now) else {
            return Err(Error::Inconsistent(format!(
                "trace {} completed twice",
                state.order_id
            )));
        };
        info!(
            trace_id = %completed.order_id,
            transfer_id = %transfer.transfer_id,
            asset_id = %transfer.asset_id,
            amount = %transfer.amount,
            "Recorded second leg"
        );
        self.create_order(&completed).await
    }

    async fn replay(&self, state: &PaymentState, transfer: &Transfer) -> Result<StepOutcome> {
        let completed_by_this = state
            .second
            .as_ref()
            .is_some_and(|leg| leg.transfer_id == transfer.transfer_id);

        if completed_by_this && !self.store.order_exists(&state.order_id).await? {
            warn!(
                trace_id = %state.order_id,
                transfer_id = %transfer.transfer_id,
                "Payment complete without an order; creating it now"
            );
            return self.create_order(state).await;
        }

        debug!(
            trace_id = %state.order_id,
            transfer_id = %transfer.transfer_id,
            "Transfer already applied"
        );
        Ok(StepOutcome::Replayed)
    }

    fn extra_leg(&self, state: &PaymentState, transfer: &Transfer) -> StepOutcome {
        match self.extra_leg_policy {
            ExtraLegPolicy::Refund => {
                info!(
                    trace_id = %state.order_id,
                    transfer_id = %transfer.transfer_id,
                    "Payment already complete; refunding extra leg"
                );
                StepOutcome::Rejected(RefundReason::ExtraLeg)
            }
            ExtraLegPolicy::Ignore => {
                warn!(
                    trace_id = %state.order_id,
                    transfer_id = %transfer.transfer_id,
                    asset_id = %transfer.asset_id,
                    amount = %transfer.amount,
                    "Payment already complete; ignoring extra leg"
                );
                StepOutcome::Ignored
            }
        }
    }

    async fn create_order(&self, state: &PaymentState) -> Result<StepOutcome> {
        let Some(order) = self.factory.create_order(state, Utc::now()) else {
            return Err(Error::Inconsistent(format!(
                "trace {} cannot produce a {} order",
                state.order_id, state.strategy
            )));
        };

        let created = match &order {
            StrategyOrder::Arbitrage(o) => self.store.create_arbitrage_order(o).await?,
            StrategyOrder::MarketMaking(o) => self.store.create_market_making_order(o).await?,
        };
        if !created {
            debug!(order_id = %order.order_id(), "Order already exists");
            return Ok(StepOutcome::Replayed);
        }

        self.notifiers
            .notify_all(Event::StrategyOrderCreated(order.clone()));
        Ok(StepOutcome::OrderCreated(order))
    }

    async fn reload(&self, instruction: &Instruction) -> Result<PaymentState> {
        let trace_id = instruction.trace_id();
        self.store
            .get_payment_state(trace_id)
            .await?
            .ok_or_else(|| Error::Inconsistent(format!("payment state for {trace_id} vanished")))
    }
}

/// Why a candidate second leg cannot complete `state`, if it cannot.
///
/// The second leg must carry the same strategy and pair as the first, and
/// its asset must be the pair's other asset. A second transfer in the same
/// asset as leg 1 is therefore rejected and refunded rather than filled, so
/// the payment stays open for the leg it is actually missing.
fn mismatch(
    state: &PaymentState,
    transfer: &Transfer,
    instruction: &Instruction,
    pair: &AssetPair,
) -> Option<&'static str> {
    if state.strategy != instruction.kind() {
        return Some("strategy");
    }
    if &state.pair_symbol != instruction.symbol() {
        return Some("pair");
    }
    if pair.counterpart(&state.first.asset_id) != Some(&transfer.asset_id) {
        return Some("asset");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::memory::MemoryStore;
    use crate::domain::{memo, OrderState, TraceId};
    use crate::port::{OrderStore, PairRegistry, PaymentStore};
    use crate::testkit::fixtures::{arbitrage_memo, btc_usdt_registry, market_making_memo, transfer};
    use crate::testkit::notifier::RecordingNotifier;
    use rust_decimal_macros::dec;

    struct Setup {
        reconciler: PaymentReconciler,
        store: Arc<MemoryStore>,
        notifier: RecordingNotifier,
    }

    fn setup(policy: ExtraLegPolicy) -> Setup {
        let store = Arc::new(MemoryStore::new());
        let notifier = RecordingNotifier::new();
        let mut registry = NotifierRegistry::new();
        registry.register(Box::new(notifier.clone()));
        let reconciler = PaymentReconciler::new(
            store.clone(),
            StrategyOrderFactory::default(),
            Arc::new(registry),
            policy,
        );
        Setup {
            reconciler,
            store,
            notifier,
        }
    }

    async fn step(s: &Setup, t: &Transfer) -> StepOutcome {
        let instruction = memo::decode(&t.memo).unwrap();
        let pair = btc_usdt_registry().resolve(instruction.symbol()).unwrap();
        s.reconciler.step(t, &instruction, &pair).await.unwrap()
    }

    #[tokio::test]
    async fn two_legs_create_one_arbitrage_order() {
        let s = setup(ExtraLegPolicy::Refund);
        let memo = arbitrage_memo("X", "BTC/USDT");

        let first = step(&s, &transfer("1", "alice", "btc", dec!(0.1), &memo)).await;
        assert_eq!(first, StepOutcome::LegRecorded);

        let second = step(&s, &transfer("2", "alice", "usdt", dec!(2500), &memo)).await;
        let StepOutcome::OrderCreated(StrategyOrder::Arbitrage(order)) = second else {
            panic!("expected arbitrage order, got {second:?}");
        };
        assert_eq!(order.balance_a.amount, dec!(0.1));
        assert_eq!(order.balance_b.amount, dec!(2500));
        assert_eq!(order.state, OrderState::Created);

        let state = s
            .store
            .get_payment_state(&TraceId::new("X"))
            .await
            .unwrap()
            .unwrap();
        assert!(state.is_complete());
        assert!(s.store.order_exists(&TraceId::new("X")).await.unwrap());
        assert_eq!(s.notifier.orders_created(), 1);
    }

    #[tokio::test]
    async fn market_making_payment_creates_market_making_order() {
        let s = setup(ExtraLegPolicy::Refund);
        let memo = market_making_memo("M", "BTC/USDT");

        step(&s, &transfer("1", "bob", "usdt", dec!(100), &memo)).await;
        let outcome = step(&s, &transfer("2", "bob", "btc", dec!(0.002), &memo)).await;

        let StepOutcome::OrderCreated(StrategyOrder::MarketMaking(order)) = outcome else {
            panic!("expected market-making order, got {outcome:?}");
        };
        assert_eq!(order.balance_a.amount, dec!(100));
        assert_eq!(order.balance_b.amount, dec!(0.002));
    }

    #[tokio::test]
    async fn same_asset_second_leg_is_rejected() {
        let s = setup(ExtraLegPolicy::Refund);
        let memo = arbitrage_memo("X", "BTC/USDT");

        step(&s, &transfer("1", "alice", "btc", dec!(0.1), &memo)).await;
        let outcome = step(&s, &transfer("2", "alice", "btc", dec!(0.2), &memo)).await;

        assert_eq!(outcome, StepOutcome::Rejected(RefundReason::LegMismatch));
        let state = s
            .store
            .get_payment_state(&TraceId::new("X"))
            .await
            .unwrap()
            .unwrap();
        assert!(!state.is_complete());
    }

    #[tokio::test]
    async fn second_leg_with_other_strategy_is_rejected() {
        let s = setup(ExtraLegPolicy::Refund);

        step(
            &s,
            &transfer("1", "alice", "btc", dec!(0.1), &arbitrage_memo("X", "BTC/USDT")),
        )
        .await;
        let outcome = step(
            &s,
            &transfer("2", "alice", "usdt", dec!(10), &market_making_memo("X", "BTC/USDT")),
        )
        .await;

        assert_eq!(outcome, StepOutcome::Rejected(RefundReason::LegMismatch));
    }

    #[tokio::test]
    async fn extra_leg_follows_policy() {
        let memo = arbitrage_memo("X", "BTC/USDT");

        let refunding = setup(ExtraLegPolicy::Refund);
        step(&refunding, &transfer("1", "a", "btc", dec!(1), &memo)).await;
        step(&refunding, &transfer("2", "a", "usdt", dec!(1), &memo)).await;
        let third = step(&refunding, &transfer("3", "a", "usdt", dec!(1), &memo)).await;
        assert_eq!(third, StepOutcome::Rejected(RefundReason::ExtraLeg));

        let ignoring = setup(ExtraLegPolicy::Ignore);
        step(&ignoring, &transfer("1", "a", "btc", dec!(1), &memo)).await;
        step(&ignoring, &transfer("2", "a", "usdt", dec!(1), &memo)).await;
        let third = step(&ignoring, &transfer("3", "a", "usdt", dec!(1), &memo)).await;
        assert_eq!(third, StepOutcome::Ignored);
        assert_eq!(ignoring.notifier.orders_created(), 1);
    }

    #[tokio::test]
    async fn replayed_first_leg_is_not_reapplied() {
        let s = setup(ExtraLegPolicy::Refund);
        let leg = transfer("1", "alice", "btc", dec!(0.1), &arbitrage_memo("X", "BTC/USDT"));

        step(&s, &leg).await;
        let again = step(&s, &leg).await;

        assert_eq!(again, StepOutcome::Replayed);
        let state = s
            .store
            .get_payment_state(&TraceId::new("X"))
            .await
            .unwrap()
            .unwrap();
        assert!(!state.is_complete());
    }

    #[tokio::test]
    async fn replayed_second_leg_repairs_missing_order() {
        let s = setup(ExtraLegPolicy::Refund);
        let memo = arbitrage_memo("X", "BTC/USDT");
        let first = transfer("1", "alice", "btc", dec!(0.1), &memo);
        let second = transfer("2", "alice", "usdt", dec!(2500), &memo);

        // Simulate a crash between the leg-2 write and the order write.
        step(&s, &first).await;
        s.store
            .update_payment_state_leg2(&TraceId::new("X"), &Leg::from(&second), Utc::now())
            .await
            .unwrap();

        let outcome = step(&s, &second).await;
        assert!(matches!(outcome, StepOutcome::OrderCreated(_)));
        assert!(s.store.order_exists(&TraceId::new("X")).await.unwrap());

        let again = step(&s, &second).await;
        assert_eq!(again, StepOutcome::Replayed);
        assert_eq!(s.notifier.orders_created(), 1);
    }
}
