//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe infrastructure dependencies: the ledger, the
//! pair registry, storage, and notifications.

pub mod ledger;
pub mod notifier;
pub mod pair;
pub mod store;
