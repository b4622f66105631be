//! Outbound adapters (driven side).

pub mod ledger;
pub mod memory;
pub mod pair;
pub mod sqlite;
