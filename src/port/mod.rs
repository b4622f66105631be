//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!     ┌──────────────┤  Domain + Port          ├──────────────┐
//!     │              └─────────────────────────┘              │
//!     ▼                         ▼                             ▼
//! ┌─────────┐            ┌─────────────┐              ┌───────────┐
//! │ Ledger  │            │   Store     │              │ Notifier  │
//! │ Adapter │            │   Adapter   │              │  Adapter  │
//! └─────────┘            └─────────────┘              └───────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`LedgerClient`] - Snapshot intake and refund submission
//! - [`PairRegistry`] - Trading pair symbol to asset IDs
//! - [`Store`] - Processed markers, payment states, orders, refunds
//! - [`Notifier`] - Downstream event notifications

pub mod outbound;

pub use outbound::ledger::{LedgerClient, RefundRequest};
pub use outbound::notifier::{
    CycleEvent, Event, LogNotifier, Notifier, NotifierRegistry, RefundEvent, SpotRequestEvent,
};
pub use outbound::pair::PairRegistry;
pub use outbound::store::{OrderStore, PaymentStore, RefundStore, SnapshotLedger, Store};
