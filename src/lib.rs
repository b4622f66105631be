//! snapsettle - ledger snapshot intake and two-leg payment reconciliation.
//!
//! A poller pulls incoming transfers from a ledger API, decodes the
//! instruction carried in each transfer memo, and either forwards it (spot),
//! pairs it with its sibling leg (arbitrage, market making) or refunds it.
//! Every transfer is archived exactly once; each trace ID yields at most one
//! strategy order.
//!
//! # Modules
//!
//! - [`domain`] - Ledger-agnostic types and the memo codec
//! - [`port`] - Trait seams: ledger, store, pair registry, notifier
//! - [`application`] - Intake pipeline, reconciler, refunds, poller
//! - [`adapter`] - HTTP ledger client, SQLite and memory stores, CLI
//! - [`infrastructure`] - Configuration, wiring and the runtime loop
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```
//! use snapsettle::domain::memo;
//!
//! // An empty or malformed memo carries no instruction.
//! assert!(memo::decode("").is_none());
//! assert!(memo::decode("not hex").is_none());
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
