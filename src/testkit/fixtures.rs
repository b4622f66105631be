//! Builders for transfers, memos and pairs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::adapter::outbound::pair::StaticPairRegistry;
use crate::domain::{
    memo, ArbitrageInstruction, AssetId, Instruction, MarketMakingInstruction, PairSymbol, Side,
    SpotInstruction, TraceId, Transfer, TransferId, UserId,
};

/// An incoming transfer received now.
pub fn transfer(id: &str, sender: &str, asset: &str, amount: Decimal, memo: &str) -> Transfer {
    Transfer {
        transfer_id: TransferId::new(id),
        sender_id: UserId::new(sender),
        asset_id: AssetId::new(asset),
        amount,
        memo: memo.to_string(),
        received_at: Utc::now(),
    }
}

/// `BTC/USDT` as `btc`/`usdt` and `ETH/USDT` as `eth`/`usdt`.
pub fn btc_usdt_registry() -> StaticPairRegistry {
    let mut registry = StaticPairRegistry::new();
    registry.insert(symbol("BTC/USDT"), AssetId::new("btc"), AssetId::new("usdt"));
    registry.insert(symbol("ETH/USDT"), AssetId::new("eth"), AssetId::new("usdt"));
    registry
}

/// Arbitrage memo between `binance` and `4swap`.
pub fn arbitrage_memo(trace: &str, pair: &str) -> String {
    memo::encode(&Instruction::Arbitrage(ArbitrageInstruction {
        trace_id: TraceId::new(trace),
        symbol: symbol(pair),
        exchange_a: "binance".into(),
        exchange_b: "4swap".into(),
    }))
}

/// Market-making memo on `mixswap`.
pub fn market_making_memo(trace: &str, pair: &str) -> String {
    memo::encode(&Instruction::MarketMaking(MarketMakingInstruction {
        trace_id: TraceId::new(trace),
        symbol: symbol(pair),
        exchange: "mixswap".into(),
    }))
}

/// Market spot buy on `binance`.
pub fn spot_memo(trace: &str, pair: &str) -> String {
    memo::encode(&Instruction::Spot(SpotInstruction {
        trace_id: TraceId::new(trace),
        symbol: symbol(pair),
        exchange: "binance".into(),
        side: Side::Buy,
        limit_price: None,
    }))
}

/// Wrap arbitrary text the way memos are wrapped, for malformed-instruction cases.
pub fn raw_memo(text: &str) -> String {
    hex::encode(STANDARD.encode(text))
}

fn symbol(s: &str) -> PairSymbol {
    match PairSymbol::parse(s) {
        Ok(symbol) => symbol,
        Err(e) => panic!("fixture symbol {s}: {e}"),
    }
}
