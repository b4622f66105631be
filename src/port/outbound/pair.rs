//! Pair registry port: trading-pair symbol to ledger assets.

use crate::domain::{AssetPair, DomainError, PairSymbol};

/// Static lookup of the two assets a trading pair trades.
pub trait PairRegistry: Send + Sync {
    /// Resolve a symbol.
    ///
    /// # Errors
    /// Returns [`DomainError::UnknownPair`] when the symbol is not registered.
    fn resolve(&self, symbol: &PairSymbol) -> Result<AssetPair, DomainError>;
}
