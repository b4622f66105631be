//! HTTP adapter for the external ledger.

pub mod client;
pub mod dto;
pub mod settings;

pub use client::HttpLedgerClient;
pub use settings::{LedgerConfig, LedgerHttpConfig, LEDGER_TOKEN_ENV};
