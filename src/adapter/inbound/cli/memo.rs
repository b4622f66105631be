//! Handlers for `memo decode` and `memo encode`.

use serde_json::json;

use crate::adapter::inbound::cli::command::{EncodeCommand, MemoArgs};
use crate::adapter::inbound::cli::output;
use crate::domain::{
    memo, ArbitrageInstruction, Instruction, MarketMakingInstruction, PairSymbol,
    SpotInstruction, TraceId,
};
use crate::error::Result;

/// Decode a memo and print the instruction it carries.
pub fn execute_decode(hex_memo: &str) -> Result<()> {
    let instruction = memo::try_decode(hex_memo.trim())?;

    output::record("instruction", &instruction);
    output::section("Instruction");
    output::field("Kind", output::highlight(instruction.kind()));
    output::field("Trace", instruction.trace_id());
    output::field("Symbol", instruction.symbol());
    match &instruction {
        Instruction::Spot(spot) => {
            output::field("Exchange", &spot.exchange);
            output::field("Side", spot.side.as_str());
            match spot.limit_price {
                Some(price) => output::field("Price", price),
                None => output::field("Price", output::muted("market")),
            }
        }
        Instruction::Arbitrage(arb) => {
            output::field("Exchange A", &arb.exchange_a);
            output::field("Exchange B", &arb.exchange_b);
        }
        Instruction::MarketMaking(mm) => output::field("Exchange", &mm.exchange),
    }
    Ok(())
}

/// Build an instruction from flags and print its memo.
pub fn execute_encode(command: &EncodeCommand) -> Result<()> {
    let instruction = build_instruction(command)?;
    let encoded = memo::encode(&instruction);

    if output::is_json() {
        output::record(
            "memo",
            &json!({
                "memo": encoded,
                "text": memo::render(&instruction),
            }),
        );
    } else {
        println!("{encoded}");
    }
    Ok(())
}

fn build_instruction(command: &EncodeCommand) -> Result<Instruction> {
    let instruction = match command {
        EncodeCommand::Arbitrage {
            common,
            exchange_a,
            exchange_b,
        } => {
            let (trace_id, symbol) = parse_common(common)?;
            Instruction::Arbitrage(ArbitrageInstruction {
                trace_id,
                symbol,
                exchange_a: exchange_a.clone(),
                exchange_b: exchange_b.clone(),
            })
        }
        EncodeCommand::MarketMaking { common, exchange } => {
            let (trace_id, symbol) = parse_common(common)?;
            Instruction::MarketMaking(MarketMakingInstruction {
                trace_id,
                symbol,
                exchange: exchange.clone(),
            })
        }
        EncodeCommand::Spot {
            common,
            exchange,
            side,
            price,
        } => {
            let (trace_id, symbol) = parse_common(common)?;
            Instruction::Spot(SpotInstruction {
                trace_id,
                symbol,
                exchange: exchange.clone(),
                side: *side,
                limit_price: *price,
            })
        }
    };
    Ok(instruction)
}

fn parse_common(args: &MemoArgs) -> Result<(TraceId, PairSymbol)> {
    Ok((TraceId::new(&args.trace), PairSymbol::parse(&args.symbol)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn common(symbol: &str) -> MemoArgs {
        MemoArgs {
            trace: "trace-1".into(),
            symbol: symbol.into(),
        }
    }

    #[test]
    fn built_instruction_survives_the_codec() {
        let command = EncodeCommand::Arbitrage {
            common: common("BTC/USDT"),
            exchange_a: "binance".into(),
            exchange_b: "4swap".into(),
        };

        let instruction = build_instruction(&command).unwrap();
        let decoded = memo::decode(memo::encode(&instruction)).unwrap();

        assert_eq!(decoded, instruction);
    }

    #[test]
    fn malformed_symbol_is_rejected() {
        let command = EncodeCommand::MarketMaking {
            common: common("BTCUSDT"),
            exchange: "mixswap".into(),
        };
        assert!(matches!(
            build_instruction(&command),
            Err(Error::Domain(_))
        ));
    }

    #[test]
    fn undecodable_memo_is_an_error() {
        assert!(matches!(execute_decode("zz"), Err(Error::Memo(_))));
    }
}
