//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`fixtures`] - Transfers, memos and a pair registry
//! - [`ledger`] - [`ScriptedLedger`](ledger::ScriptedLedger), a scripted ledger client
//! - [`notifier`] - [`RecordingNotifier`](notifier::RecordingNotifier), captures events
//! - [`store`] - [`FailingStore`](store::FailingStore), a store whose writes can be broken or slowed
//! - [`config`] - Canonical test configuration

pub mod config;
pub mod fixtures;
pub mod ledger;
pub mod notifier;
pub mod store;
