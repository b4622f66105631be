//! Notifier port for pipeline events.
//!
//! Downstream consumers (strategy engines, spot order placement, operator
//! alerts) subscribe through this port. Delivery is out of scope here.

use rust_decimal::Decimal;

use crate::domain::{
    AssetId, RefundReason, RefundRecord, SpotInstruction, StrategyOrder, TransferId, TxId, UserId,
};

/// Events that can trigger notifications.
#[derive(Debug, Clone)]
pub enum Event {
    /// A completed two-leg payment produced a strategy order.
    StrategyOrderCreated(StrategyOrder),
    /// A single-leg spot instruction was funded.
    SpotOrderRequested(SpotRequestEvent),
    /// Funds were returned to the sender.
    RefundIssued(RefundEvent),
    /// A refund could not be submitted and needs attention.
    RefundFailed(RefundEvent),
    /// A poll cycle finished.
    CycleCompleted(CycleEvent),
}

/// Funded spot instruction.
#[derive(Debug, Clone)]
pub struct SpotRequestEvent {
    pub transfer_id: TransferId,
    pub sender_id: UserId,
    pub asset_id: AssetId,
    pub amount: Decimal,
    pub instruction: SpotInstruction,
}

/// Refund outcome.
#[derive(Debug, Clone)]
pub struct RefundEvent {
    pub transfer_id: TransferId,
    pub recipient_id: UserId,
    pub asset_id: AssetId,
    pub amount: Decimal,
    pub reason: RefundReason,
    pub attempts: u32,
    pub tx_id: Option<TxId>,
    pub error: Option<String>,
}

impl From<&RefundRecord> for RefundEvent {
    fn from(record: &RefundRecord) -> Self {
        Self {
            transfer_id: record.transfer_id.clone(),
            recipient_id: record.recipient_id.clone(),
            asset_id: record.asset_id.clone(),
            amount: record.amount,
            reason: record.reason,
            attempts: record.attempts,
            tx_id: record.tx_id.clone(),
            error: record.last_error.clone(),
        }
    }
}

/// Summary of one poll cycle.
#[derive(Debug, Clone)]
pub struct CycleEvent {
    pub fetched: usize,
    pub orders_created: usize,
    pub refunded: usize,
    pub refund_failed: usize,
    pub failed: usize,
    pub refunds_stuck: usize,
}

/// Trait for notification handlers.
///
/// Notifications are fire-and-forget.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - The `notify` method should not block; spawn a task for slow I/O
pub trait Notifier: Send + Sync {
    fn notify(&self, event: Event);
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts events to all registered notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    /// Add a notifier; events are delivered in registration order.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Deliver `event` to every registered notifier.
    pub fn notify_all(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A logging notifier that logs events via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        use tracing::{info, warn};
        match event {
            Event::StrategyOrderCreated(order) => {
                let (a, b) = order.balances();
                info!(
                    order_id = %order.order_id(),
                    strategy = %order.kind(),
                    pair = %order.pair_symbol(),
                    balance_a = %a.amount,
                    asset_a = %a.asset_id,
                    balance_b = %b.amount,
                    asset_b = %b.asset_id,
                    "Strategy order created"
                );
            }
            Event::SpotOrderRequested(e) => {
                info!(
                    transfer_id = %e.transfer_id,
                    trace_id = %e.instruction.trace_id,
                    pair = %e.instruction.symbol,
                    side = e.instruction.side.as_str(),
                    amount = %e.amount,
                    "Spot order requested"
                );
            }
            Event::RefundIssued(e) => {
                info!(
                    transfer_id = %e.transfer_id,
                    recipient = %e.recipient_id,
                    asset_id = %e.asset_id,
                    amount = %e.amount,
                    reason = %e.reason,
                    "Refund issued"
                );
            }
            Event::RefundFailed(e) => {
                warn!(
                    transfer_id = %e.transfer_id,
                    recipient = %e.recipient_id,
                    asset_id = %e.asset_id,
                    amount = %e.amount,
                    reason = %e.reason,
                    attempts = e.attempts,
                    error = e.error.as_deref().unwrap_or("unknown"),
                    "Refund failed"
                );
            }
            Event::CycleCompleted(e) => {
                info!(
                    fetched = e.fetched,
                    orders = e.orders_created,
                    refunded = e.refunded,
                    refund_failed = e.refund_failed,
                    failed = e.failed,
                    stuck_refunds = e.refunds_stuck,
                    "Poll cycle completed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counting(Arc<AtomicUsize>);

    impl Notifier for Counting {
        fn notify(&self, _event: Event) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn cycle_event() -> Event {
        Event::CycleCompleted(CycleEvent {
            fetched: 3,
            orders_created: 1,
            refunded: 0,
            refund_failed: 0,
            failed: 0,
            refunds_stuck: 0,
        })
    }

    #[test]
    fn registry_broadcasts_to_every_notifier() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut registry = NotifierRegistry::new();
        registry.register(Box::new(Counting(Arc::clone(&count))));
        registry.register(Box::new(Counting(Arc::clone(&count))));
        registry.register(Box::new(LogNotifier));

        registry.notify_all(cycle_event());

        assert_eq!(registry.len(), 3);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn empty_registry_is_a_noop() {
        let registry = NotifierRegistry::default();
        assert!(registry.is_empty());
        registry.notify_all(cycle_event());
    }

    #[test]
    fn log_notifier_accepts_every_event() {
        LogNotifier.notify(cycle_event());
    }
}
