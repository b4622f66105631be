//! Typed instructions decoded from transfer memos.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::TraceId;
use super::pair::PairSymbol;

/// Strategy family an instruction (and its payment state) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Arbitrage,
    MarketMaking,
    Spot,
}

impl StrategyKind {
    /// Stable lowercase label used in storage and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Arbitrage => "arbitrage",
            Self::MarketMaking => "market_making",
            Self::Spot => "spot",
        }
    }

    /// Whether instructions of this kind are funded by two transfers.
    #[must_use]
    pub const fn is_two_leg(self) -> bool {
        matches!(self, Self::Arbitrage | Self::MarketMaking)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "arbitrage" => Ok(Self::Arbitrage),
            "market_making" => Ok(Self::MarketMaking),
            "spot" => Ok(Self::Spot),
            other => Err(format!("unknown strategy kind '{other}'")),
        }
    }
}

/// Direction of a spot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            other => Err(format!("unknown side '{other}'")),
        }
    }
}

/// Single-leg spot order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotInstruction {
    pub trace_id: TraceId,
    pub symbol: PairSymbol,
    pub exchange: String,
    pub side: Side,
    /// Limit price; `None` means a market order.
    pub limit_price: Option<Decimal>,
}

/// Two-leg arbitrage between two named exchanges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArbitrageInstruction {
    pub trace_id: TraceId,
    pub symbol: PairSymbol,
    pub exchange_a: String,
    pub exchange_b: String,
}

/// Two-leg market making on one exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketMakingInstruction {
    pub trace_id: TraceId,
    pub symbol: PairSymbol,
    pub exchange: String,
}

/// A decoded memo instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Instruction {
    Spot(SpotInstruction),
    Arbitrage(ArbitrageInstruction),
    MarketMaking(MarketMakingInstruction),
}

impl Instruction {
    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Spot(_) => StrategyKind::Spot,
            Self::Arbitrage(_) => StrategyKind::Arbitrage,
            Self::MarketMaking(_) => StrategyKind::MarketMaking,
        }
    }

    #[must_use]
    pub fn trace_id(&self) -> &TraceId {
        match self {
            Self::Spot(i) => &i.trace_id,
            Self::Arbitrage(i) => &i.trace_id,
            Self::MarketMaking(i) => &i.trace_id,
        }
    }

    #[must_use]
    pub fn symbol(&self) -> &PairSymbol {
        match self {
            Self::Spot(i) => &i.symbol,
            Self::Arbitrage(i) => &i.symbol,
            Self::MarketMaking(i) => &i.symbol,
        }
    }

    /// Exchange names named by the instruction, in memo order.
    #[must_use]
    pub fn venues(&self) -> Vec<String> {
        match self {
            Self::Spot(i) => vec![i.exchange.clone()],
            Self::Arbitrage(i) => vec![i.exchange_a.clone(), i.exchange_b.clone()],
            Self::MarketMaking(i) => vec![i.exchange.clone()],
        }
    }
}
