//! Strategy orders created from completed payments.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{AssetId, TraceId};
use super::instruction::StrategyKind;
use super::pair::PairSymbol;

/// Lifecycle state of a strategy order.
///
/// Only `Created` is set here; later states belong to the execution engines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    #[default]
    Created,
    Running,
    Stopped,
}

impl OrderState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

impl FromStr for OrderState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "running" => Ok(Self::Running),
            "stopped" => Ok(Self::Stopped),
            other => Err(format!("unknown order state '{other}'")),
        }
    }
}

/// Where a running strategy takes its reference price from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    OrderBook,
    MidPrice,
    LastTrade,
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::OrderBook => "order_book",
            Self::MidPrice => "mid_price",
            Self::LastTrade => "last_trade",
        };
        f.write_str(label)
    }
}

/// Funds committed to one side of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub asset_id: AssetId,
    pub amount: Decimal,
}

/// Default execution parameters for arbitrage orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArbitrageParams {
    pub min_spread_pct: Decimal,
    pub refresh_interval_secs: u64,
    pub price_source: PriceSource,
}

/// Default execution parameters for market-making orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketMakingParams {
    pub bid_spread_pct: Decimal,
    pub ask_spread_pct: Decimal,
    pub order_layers: u32,
    pub refresh_interval_secs: u64,
    pub price_source: PriceSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArbitrageOrder {
    pub order_id: TraceId,
    pub pair_symbol: PairSymbol,
    pub exchange_a: String,
    pub exchange_b: String,
    /// Leg recorded first.
    pub balance_a: Balance,
    /// Leg recorded second.
    pub balance_b: Balance,
    pub params: ArbitrageParams,
    pub state: OrderState,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketMakingOrder {
    pub order_id: TraceId,
    pub pair_symbol: PairSymbol,
    pub exchange: String,
    /// Leg recorded first.
    pub balance_a: Balance,
    /// Leg recorded second.
    pub balance_b: Balance,
    pub params: MarketMakingParams,
    pub state: OrderState,
    pub created_at: DateTime<Utc>,
}

/// A persisted strategy order of either two-leg family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategyOrder {
    Arbitrage(ArbitrageOrder),
    MarketMaking(MarketMakingOrder),
}

impl StrategyOrder {
    #[must_use]
    pub fn order_id(&self) -> &TraceId {
        match self {
            Self::Arbitrage(order) => &order.order_id,
            Self::MarketMaking(order) => &order.order_id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Arbitrage(_) => StrategyKind::Arbitrage,
            Self::MarketMaking(_) => StrategyKind::MarketMaking,
        }
    }

    #[must_use]
    pub fn pair_symbol(&self) -> &PairSymbol {
        match self {
            Self::Arbitrage(order) => &order.pair_symbol,
            Self::MarketMaking(order) => &order.pair_symbol,
        }
    }

    #[must_use]
    pub fn balances(&self) -> (&Balance, &Balance) {
        match self {
            Self::Arbitrage(order) => (&order.balance_a, &order.balance_b),
            Self::MarketMaking(order) => (&order.balance_a, &order.balance_b),
        }
    }

    #[must_use]
    pub fn state(&self) -> OrderState {
        match self {
            Self::Arbitrage(order) => order.state,
            Self::MarketMaking(order) => order.state,
        }
    }
}
