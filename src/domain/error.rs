//! Domain validation errors for core domain types.
//!
//! These errors are returned when a domain invariant is violated, such as a
//! malformed pair symbol or an asset that does not belong to the pair an
//! instruction names.

use thiserror::Error;

use super::id::AssetId;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Pair symbols must look like `BASE/QUOTE`.
    #[error("invalid pair symbol '{symbol}'")]
    InvalidSymbol {
        /// The symbol that failed to parse.
        symbol: String,
    },

    /// The pair registry has no entry for the symbol.
    #[error("unknown trading pair '{symbol}'")]
    UnknownPair {
        /// The symbol that was looked up.
        symbol: String,
    },

    /// The transfer's asset is not one of the two assets of the pair.
    #[error("asset {asset_id} does not belong to pair {symbol}")]
    AssetMismatch {
        /// The asset that was received.
        asset_id: AssetId,
        /// The pair named in the instruction.
        symbol: String,
    },
}

/// Reasons a memo failed to decode into an instruction.
///
/// None of these are fatal: the transfer is archived without an instruction.
#[derive(Error, Debug, Clone)]
pub enum MemoError {
    #[error("memo is empty")]
    Empty,

    #[error("memo is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("memo payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("memo payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("unknown instruction prefix '{0}'")]
    UnknownPrefix(String),

    #[error("malformed memo field '{0}'")]
    MalformedField(String),

    #[error("duplicate memo field '{0}'")]
    DuplicateField(String),

    #[error("missing memo field '{0}'")]
    MissingField(&'static str),

    #[error("invalid value for memo field {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
