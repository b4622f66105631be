//! Builds strategy orders from completed payments.
//!
//! Execution parameters are conservative defaults taken from configuration,
//! never derived from the payment itself.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::domain::{
    ArbitrageOrder, ArbitrageParams, Balance, Leg, MarketMakingOrder, MarketMakingParams,
    OrderState, PaymentState, PriceSource, StrategyKind, StrategyOrder,
};

/// Default parameters for new arbitrage orders.
#[derive(Debug, Clone, Deserialize)]
pub struct ArbitrageDefaults {
    #[serde(default = "default_min_spread_pct")]
    pub min_spread_pct: Decimal,
    #[serde(default = "default_arbitrage_refresh_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_arbitrage_price_source")]
    pub price_source: PriceSource,
}

fn default_min_spread_pct() -> Decimal {
    dec!(0.5)
}

fn default_arbitrage_refresh_secs() -> u64 {
    10
}

fn default_arbitrage_price_source() -> PriceSource {
    PriceSource::OrderBook
}

impl Default for ArbitrageDefaults {
    fn default() -> Self {
        Self {
            min_spread_pct: default_min_spread_pct(),
            refresh_interval_secs: default_arbitrage_refresh_secs(),
            price_source: default_arbitrage_price_source(),
        }
    }
}

/// Default parameters for new market-making orders.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketMakingDefaults {
    #[serde(default = "default_spread_pct")]
    pub bid_spread_pct: Decimal,
    #[serde(default = "default_spread_pct")]
    pub ask_spread_pct: Decimal,
    #[serde(default = "default_order_layers")]
    pub order_layers: u32,
    #[serde(default = "default_market_making_refresh_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_market_making_price_source")]
    pub price_source: PriceSource,
}

fn default_spread_pct() -> Decimal {
    dec!(0.3)
}

fn default_order_layers() -> u32 {
    3
}

fn default_market_making_refresh_secs() -> u64 {
    30
}

fn default_market_making_price_source() -> PriceSource {
    PriceSource::MidPrice
}

impl Default for MarketMakingDefaults {
    fn default() -> Self {
        Self {
            bid_spread_pct: default_spread_pct(),
            ask_spread_pct: default_spread_pct(),
            order_layers: default_order_layers(),
            refresh_interval_secs: default_market_making_refresh_secs(),
            price_source: default_market_making_price_source(),
        }
    }
}

/// `[execution]` configuration section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionDefaults {
    #[serde(default)]
    pub arbitrage: ArbitrageDefaults,
    #[serde(default)]
    pub market_making: MarketMakingDefaults,
}

/// Translates completed payment states into strategy orders.
#[derive(Debug, Clone, Default)]
pub struct StrategyOrderFactory {
    defaults: ExecutionDefaults,
}

impl StrategyOrderFactory {
    #[must_use]
    pub fn new(defaults: ExecutionDefaults) -> Self {
        Self { defaults }
    }

    /// Build the order matching the payment's strategy.
    ///
    /// Returns `None` for incomplete payments and for spot payments, which
    /// never produce a strategy order.
    #[must_use]
    pub fn create_order(&self, state: &PaymentState, now: DateTime<Utc>) -> Option<StrategyOrder> {
        match state.strategy {
            StrategyKind::Arbitrage => self
                .create_arbitrage_order(state, now)
                .map(StrategyOrder::Arbitrage),
            StrategyKind::MarketMaking => self
                .create_market_making_order(state, now)
                .map(StrategyOrder::MarketMaking),
            StrategyKind::Spot => None,
        }
    }

    #[must_use]
    pub fn create_arbitrage_order(
        &self,
        state: &PaymentState,
        now: DateTime<Utc>,
    ) -> Option<ArbitrageOrder> {
        let second = state.second.as_ref()?;
        let defaults = &self.defaults.arbitrage;
        Some(ArbitrageOrder {
            order_id: state.order_id.clone(),
            pair_symbol: state.pair_symbol.clone(),
            exchange_a: venue(state, 0),
            exchange_b: venue(state, 1),
            balance_a: balance(&state.first),
            balance_b: balance(second),
            params: ArbitrageParams {
                min_spread_pct: defaults.min_spread_pct,
                refresh_interval_secs: defaults.refresh_interval_secs,
                price_source: defaults.price_source,
            },
            state: OrderState::Created,
            created_at: now,
        })
    }

    #[must_use]
    pub fn create_market_making_order(
        &self,
        state: &PaymentState,
        now: DateTime<Utc>,
    ) -> Option<MarketMakingOrder> {
        let second = state.second.as_ref()?;
        let defaults = &self.defaults.market_making;
        Some(MarketMakingOrder {
            order_id: state.order_id.clone(),
            pair_symbol: state.pair_symbol.clone(),
            exchange: venue(state, 0),
            balance_a: balance(&state.first),
            balance_b: balance(second),
            params: MarketMakingParams {
                bid_spread_pct: defaults.bid_spread_pct,
                ask_spread_pct: defaults.ask_spread_pct,
                order_layers: defaults.order_layers,
                refresh_interval_secs: defaults.refresh_interval_secs,
                price_source: defaults.price_source,
            },
            state: OrderState::Created,
            created_at: now,
        })
    }
}

fn balance(leg: &Leg) -> Balance {
    Balance {
        asset_id: leg.asset_id.clone(),
        amount: leg.amount,
    }
}

fn venue(state: &PaymentState, index: usize) -> String {
    state.venues.get(index).cloned().unwrap_or_default()
}
