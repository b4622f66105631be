//! Poller configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::application::{ExtraLegPolicy, PollerSettings};

/// `[poller]` configuration section.
#[derive(Debug, Clone, Deserialize)]
pub struct PollerConfig {
    /// Milliseconds between poll cycles.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Transfers processed concurrently per cycle.
    #[serde(default = "default_max_concurrent_transfers")]
    pub max_concurrent_transfers: usize,
    /// Refund submission attempts before a refund is reported stuck.
    #[serde(default = "default_refund_retry_limit")]
    pub refund_retry_limit: u32,
    /// Failed refunds retried at the start of each cycle.
    #[serde(default = "default_refund_retry_batch")]
    pub refund_retry_batch: usize,
    /// Handling of transfers for an already complete payment.
    #[serde(default)]
    pub extra_leg_policy: ExtraLegPolicy,
}

const fn default_interval_ms() -> u64 {
    5000
}

fn default_max_concurrent_transfers() -> usize {
    num_cpus::get().max(1)
}

const fn default_refund_retry_limit() -> u32 {
    5
}

const fn default_refund_retry_batch() -> usize {
    50
}

impl PollerConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    #[must_use]
    pub fn settings(&self) -> PollerSettings {
        PollerSettings {
            max_concurrent_transfers: self.max_concurrent_transfers,
            refund_retry_limit: self.refund_retry_limit,
            refund_retry_batch: self.refund_retry_batch,
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_concurrent_transfers: default_max_concurrent_transfers(),
            refund_retry_limit: default_refund_retry_limit(),
            refund_retry_batch: default_refund_retry_batch(),
            extra_leg_policy: ExtraLegPolicy::default(),
        }
    }
}
