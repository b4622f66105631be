//! Trading pair symbols and their resolved assets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::AssetId;

/// A trading pair symbol such as `BTC/USDT`.
///
/// Both sides are non-empty and contain no `/` or `|`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PairSymbol {
    base: String,
    quote: String,
}

impl PairSymbol {
    /// Parse a `BASE/QUOTE` symbol.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidSymbol`] if either side is empty or the
    /// separator is missing.
    pub fn parse(symbol: &str) -> Result<Self, DomainError> {
        let invalid = || DomainError::InvalidSymbol {
            symbol: symbol.to_string(),
        };
        let (base, quote) = symbol.split_once('/').ok_or_else(invalid)?;
        let valid_side = |side: &str| {
            !side.is_empty() && !side.contains(['/', '|', '=']) && !side.contains(char::is_whitespace)
        };
        if !valid_side(base) || !valid_side(quote) {
            return Err(invalid());
        }
        Ok(Self {
            base: base.to_string(),
            quote: quote.to_string(),
        })
    }

    /// The base currency ticker (left side).
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The quote currency ticker (right side).
    #[must_use]
    pub fn quote(&self) -> &str {
        &self.quote
    }
}

impl fmt::Display for PairSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for PairSymbol {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PairSymbol {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PairSymbol> for String {
    fn from(symbol: PairSymbol) -> Self {
        symbol.to_string()
    }
}

/// The two ledger assets a pair trades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPair {
    /// Asset of the base side.
    pub base_asset_id: AssetId,
    /// Asset of the quote (target) side.
    pub target_asset_id: AssetId,
}

impl AssetPair {
    /// Whether the asset is either side of this pair.
    #[must_use]
    pub fn contains(&self, asset_id: &AssetId) -> bool {
        &self.base_asset_id == asset_id || &self.target_asset_id == asset_id
    }

    /// The side of the pair opposite to `asset_id`, if `asset_id` is in the pair.
    #[must_use]
    pub fn counterpart(&self, asset_id: &AssetId) -> Option<&AssetId> {
        if &self.base_asset_id == asset_id {
            Some(&self.target_asset_id)
        } else if &self.target_asset_id == asset_id {
            Some(&self.base_asset_id)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_base_and_quote() {
        let symbol = PairSymbol::parse("BTC/USDT").unwrap();
        assert_eq!(symbol.base(), "BTC");
        assert_eq!(symbol.quote(), "USDT");
        assert_eq!(symbol.to_string(), "BTC/USDT");
    }

    #[test]
    fn rejects_malformed_symbols() {
        for raw in ["BTC", "/USDT", "BTC/", "BTC/USDT/X", "BT C/USDT", "BTC|/USDT", ""] {
            assert!(
                matches!(PairSymbol::parse(raw), Err(DomainError::InvalidSymbol { .. })),
                "expected {raw:?} to be rejected"
            );
        }
    }

    #[test]
    fn counterpart_returns_other_side() {
        let pair = AssetPair {
            base_asset_id: AssetId::new("btc"),
            target_asset_id: AssetId::new("usdt"),
        };
        assert_eq!(pair.counterpart(&AssetId::new("btc")), Some(&AssetId::new("usdt")));
        assert_eq!(pair.counterpart(&AssetId::new("usdt")), Some(&AssetId::new("btc")));
        assert_eq!(pair.counterpart(&AssetId::new("eth")), None);
        assert!(!pair.contains(&AssetId::new("eth")));
    }
}
