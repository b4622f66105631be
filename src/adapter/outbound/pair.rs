//! Static pair registry loaded from configuration.

use std::collections::HashMap;

use crate::domain::{AssetId, AssetPair, DomainError, PairSymbol};
use crate::port::PairRegistry;

/// Fixed symbol to asset mapping.
#[derive(Debug, Clone, Default)]
pub struct StaticPairRegistry {
    pairs: HashMap<PairSymbol, AssetPair>,
}

impl StaticPairRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pair, replacing any previous entry for the symbol.
    pub fn insert(&mut self, symbol: PairSymbol, base: AssetId, target: AssetId) {
        self.pairs.insert(
            symbol,
            AssetPair {
                base_asset_id: base,
                target_asset_id: target,
            },
        );
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<(PairSymbol, AssetId, AssetId)> for StaticPairRegistry {
    fn from_iter<I: IntoIterator<Item = (PairSymbol, AssetId, AssetId)>>(iter: I) -> Self {
        let mut registry = Self::new();
        for (symbol, base, target) in iter {
            registry.insert(symbol, base, target);
        }
        registry
    }
}

impl PairRegistry for StaticPairRegistry {
    fn resolve(&self, symbol: &PairSymbol) -> Result<AssetPair, DomainError> {
        self.pairs
            .get(symbol)
            .cloned()
            .ok_or_else(|| DomainError::UnknownPair {
                symbol: symbol.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(s: &str) -> PairSymbol {
        PairSymbol::parse(s).unwrap()
    }

    #[test]
    fn resolves_registered_pairs() {
        let registry: StaticPairRegistry = [(
            symbol("BTC/USDT"),
            AssetId::new("btc"),
            AssetId::new("usdt"),
        )]
        .into_iter()
        .collect();

        let pair = registry.resolve(&symbol("BTC/USDT")).unwrap();
        assert_eq!(pair.base_asset_id, AssetId::new("btc"));
        assert_eq!(pair.target_asset_id, AssetId::new("usdt"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_symbol_is_an_error() {
        let registry = StaticPairRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(
            registry.resolve(&symbol("ETH/USDT")),
            Err(DomainError::UnknownPair {
                symbol: "ETH/USDT".into()
            })
        );
    }
}
