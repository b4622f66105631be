//! Event-capturing notifier.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::port::{Event, Notifier};

/// Records every event. Clones share the same log, so register one clone
/// and assert on another.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn orders_created(&self) -> usize {
        self.count(|e| matches!(e, Event::StrategyOrderCreated(_)))
    }

    pub fn spot_requests(&self) -> usize {
        self.count(|e| matches!(e, Event::SpotOrderRequested(_)))
    }

    pub fn refunds_issued(&self) -> usize {
        self.count(|e| matches!(e, Event::RefundIssued(_)))
    }

    pub fn refunds_failed(&self) -> usize {
        self.count(|e| matches!(e, Event::RefundFailed(_)))
    }

    pub fn cycles(&self) -> usize {
        self.count(|e| matches!(e, Event::CycleCompleted(_)))
    }

    fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().iter().filter(|&e| pred(e)).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: Event) {
        self.events.lock().push(event);
    }
}
