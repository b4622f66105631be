//! Application services (use cases).
//!
//! The intake pipeline turns ledger transfers into payment states, strategy
//! orders, spot requests and refunds, using only the ports.

pub mod intake;
pub mod order_factory;
pub mod poller;
pub mod reconcile;
pub mod refund;
pub mod trace_lock;

pub use intake::{IntakePipeline, TransferOutcome};
pub use order_factory::{
    ArbitrageDefaults, ExecutionDefaults, MarketMakingDefaults, StrategyOrderFactory,
};
pub use poller::{CycleOutcome, CycleReport, IntakePoller, PollerSettings};
pub use reconcile::{ExtraLegPolicy, PaymentReconciler, StepOutcome};
pub use refund::{AssetCheck, RefundDecider, RefundOutcome, RetrySummary};
pub use trace_lock::TraceLocks;
