use thiserror::Error;

use crate::domain::error::{DomainError, MemoError};

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Errors reported by the external ledger.
#[derive(Error, Debug, Clone)]
pub enum LedgerError {
    /// Pulling snapshots failed. Transient; retried on the next tick.
    #[error("failed to fetch incoming transfers: {0}")]
    Fetch(String),

    /// Submitting a refund transfer failed. The refund stays retryable.
    #[error("failed to submit refund: {0}")]
    Refund(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Memo(#[from] MemoError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),

    /// Stored records contradict each other; needs an operator.
    #[error("inconsistent state: {0}")]
    Inconsistent(String),

    /// Shared infrastructure failed mid-cycle; unarchived transfers are retried next tick.
    #[error("poll cycle aborted after {failed} transfer failure(s)")]
    CycleAborted { failed: usize },
}

impl Error {
    /// Whether the error comes from shared infrastructure (the store) rather
    /// than from a single transfer.
    #[must_use]
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Connection(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
