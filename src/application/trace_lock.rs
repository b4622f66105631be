//! Per-trace-ID mutual exclusion.
//!
//! Transfers for different trace IDs are processed concurrently; all work
//! for one trace ID runs under its lock so the two legs of an order cannot
//! race on the leg-2 transition.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::TraceId;

/// Keyed async mutexes, one per trace ID currently in use.
#[derive(Debug, Default)]
pub struct TraceLocks {
    locks: DashMap<TraceId, Arc<Mutex<()>>>,
}

impl TraceLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `trace_id`, waiting for any current holder.
    pub async fn acquire(&self, trace_id: &TraceId) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(trace_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drop entries nobody holds or waits on.
    pub fn prune(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_trace_is_serialized() {
        let locks = Arc::new(TraceLocks::new());
        let active = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let active = Arc::clone(&active);
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(&TraceId::new("T")).await;
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_traces_do_not_block_each_other() {
        let locks = TraceLocks::new();
        let _a = locks.acquire(&TraceId::new("A")).await;
        let acquired =
            tokio::time::timeout(Duration::from_millis(50), locks.acquire(&TraceId::new("B")))
                .await;
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn prune_keeps_held_locks_only() {
        let locks = TraceLocks::new();
        let held = locks.acquire(&TraceId::new("A")).await;
        drop(locks.acquire(&TraceId::new("B")).await);
        assert_eq!(locks.len(), 2);

        locks.prune();
        assert_eq!(locks.len(), 1);

        drop(held);
        locks.prune();
        assert!(locks.is_empty());
    }
}
