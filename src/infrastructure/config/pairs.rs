//! Trading pair table.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::adapter::outbound::pair::StaticPairRegistry;
use crate::domain::{AssetId, PairSymbol};
use crate::error::{ConfigError, Result};

/// One `[[pairs]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PairConfig {
    /// Symbol as written in memos, e.g. `BTC/USDT`.
    pub symbol: String,
    pub base_asset_id: String,
    pub target_asset_id: String,
}

/// Validate the pair table and build the registry from it.
///
/// # Errors
/// Returns [`ConfigError::InvalidValue`] for malformed or duplicate symbols,
/// empty asset IDs, and pairs whose two sides are the same asset.
pub fn build_registry(pairs: &[PairConfig]) -> Result<StaticPairRegistry> {
    let mut seen = HashSet::with_capacity(pairs.len());
    let mut registry = StaticPairRegistry::new();

    for pair in pairs {
        let symbol = PairSymbol::parse(&pair.symbol).map_err(|e| ConfigError::InvalidValue {
            field: "pairs.symbol",
            reason: e.to_string(),
        })?;
        if !seen.insert(symbol.clone()) {
            return Err(ConfigError::InvalidValue {
                field: "pairs.symbol",
                reason: format!("duplicate pair {symbol}"),
            }
            .into());
        }
        if pair.base_asset_id.trim().is_empty() || pair.target_asset_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "pairs.asset_id",
                reason: format!("pair {symbol} needs both asset IDs"),
            }
            .into());
        }
        if pair.base_asset_id == pair.target_asset_id {
            return Err(ConfigError::InvalidValue {
                field: "pairs.asset_id",
                reason: format!("pair {symbol} uses the same asset on both sides"),
            }
            .into());
        }

        registry.insert(
            symbol,
            AssetId::new(pair.base_asset_id.as_str()),
            AssetId::new(pair.target_asset_id.as_str()),
        );
    }

    Ok(registry)
}
