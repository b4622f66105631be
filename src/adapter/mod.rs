//! Adapters connecting the application to the outside world.
//!
//! - [`inbound`] - Command-line entry points
//! - [`outbound`] - Ledger API, stores and the pair registry

pub mod inbound;
pub mod outbound;
