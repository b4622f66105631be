//! Memo codec: `hex(base64(PREFIX|key=value|...))`.
//!
//! Memos are attached to ledger transfers as hex text. Decoding the hex
//! yields base64, which decodes to a UTF-8 instruction string. The first two
//! characters select the instruction kind:
//!
//! | Prefix | Kind | Required keys |
//! |--------|------|---------------|
//! | `SP` | spot | `trace`, `symbol`, `exchange`, `side` (`price` optional) |
//! | `AR` | arbitrage | `trace`, `symbol`, `ex_a`, `ex_b` |
//! | `MM` | market making | `trace`, `symbol`, `exchange` |
//!
//! Fields follow the prefix as `|key=value` segments. Unknown keys are
//! ignored so newer clients can add fields. Values must not contain `|`.
//!
//! The codec is pure. Every failure maps to "no instruction".

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rust_decimal::Decimal;

use super::error::MemoError;
use super::id::TraceId;
use super::instruction::{
    ArbitrageInstruction, Instruction, MarketMakingInstruction, Side, SpotInstruction,
};
use super::pair::PairSymbol;

const SPOT_PREFIX: &str = "SP";
const ARBITRAGE_PREFIX: &str = "AR";
const MARKET_MAKING_PREFIX: &str = "MM";
const SEPARATOR: char = '|';

/// Decode a memo into an instruction.
///
/// Returns `None` for an empty memo and for any decode failure.
#[must_use]
pub fn decode(memo: impl AsRef<[u8]>) -> Option<Instruction> {
    try_decode(memo).ok()
}

/// Decode a memo, reporting why decoding failed.
///
/// # Errors
/// Returns a [`MemoError`] describing the first stage that failed.
pub fn try_decode(memo: impl AsRef<[u8]>) -> Result<Instruction, MemoError> {
    let memo = memo.as_ref();
    if memo.is_empty() {
        return Err(MemoError::Empty);
    }

    let base64_text = hex::decode(memo)?;
    let raw = STANDARD.decode(base64_text)?;
    let text = String::from_utf8(raw)?;
    parse_instruction(&text)
}

/// Encode an instruction into its memo form.
#[must_use]
pub fn encode(instruction: &Instruction) -> String {
    hex::encode(STANDARD.encode(render(instruction)))
}

/// Render the plain-text instruction string (before base64 and hex).
#[must_use]
pub fn render(instruction: &Instruction) -> String {
    let mut fields: Vec<(&str, String)> = vec![
        ("trace", instruction.trace_id().to_string()),
        ("symbol", instruction.symbol().to_string()),
    ];
    let prefix = match instruction {
        Instruction::Spot(spot) => {
            fields.push(("exchange", spot.exchange.clone()));
            fields.push(("side", spot.side.as_str().to_string()));
            if let Some(price) = spot.limit_price {
                fields.push(("price", price.to_string()));
            }
            SPOT_PREFIX
        }
        Instruction::Arbitrage(arb) => {
            fields.push(("ex_a", arb.exchange_a.clone()));
            fields.push(("ex_b", arb.exchange_b.clone()));
            ARBITRAGE_PREFIX
        }
        Instruction::MarketMaking(mm) => {
            fields.push(("exchange", mm.exchange.clone()));
            MARKET_MAKING_PREFIX
        }
    };

    let mut text = String::from(prefix);
    for (key, value) in fields {
        text.push(SEPARATOR);
        text.push_str(key);
        text.push('=');
        text.push_str(&value);
    }
    text
}

fn parse_instruction(text: &str) -> Result<Instruction, MemoError> {
    let prefix = text
        .get(..2)
        .ok_or_else(|| MemoError::UnknownPrefix(text.to_string()))?;
    let rest = &text[2..];

    match prefix {
        SPOT_PREFIX => {
            let mut fields = Fields::parse(rest)?;
            Ok(Instruction::Spot(SpotInstruction {
                trace_id: fields.trace_id()?,
                symbol: fields.symbol()?,
                exchange: fields.required("exchange")?,
                side: fields.side()?,
                limit_price: fields.price()?,
            }))
        }
        ARBITRAGE_PREFIX => {
            let mut fields = Fields::parse(rest)?;
            Ok(Instruction::Arbitrage(ArbitrageInstruction {
                trace_id: fields.trace_id()?,
                symbol: fields.symbol()?,
                exchange_a: fields.required("ex_a")?,
                exchange_b: fields.required("ex_b")?,
            }))
        }
        MARKET_MAKING_PREFIX => {
            let mut fields = Fields::parse(rest)?;
            Ok(Instruction::MarketMaking(MarketMakingInstruction {
                trace_id: fields.trace_id()?,
                symbol: fields.symbol()?,
                exchange: fields.required("exchange")?,
            }))
        }
        other => Err(MemoError::UnknownPrefix(other.to_string())),
    }
}

/// `key=value` segments following the prefix.
struct Fields<'a> {
    values: BTreeMap<&'a str, &'a str>,
}

impl<'a> Fields<'a> {
    fn parse(rest: &'a str) -> Result<Self, MemoError> {
        let mut values = BTreeMap::new();
        if rest.is_empty() {
            return Ok(Self { values });
        }

        let body = rest
            .strip_prefix(SEPARATOR)
            .ok_or_else(|| MemoError::MalformedField(rest.to_string()))?;
        for segment in body.split(SEPARATOR) {
            let (key, value) = segment
                .split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| MemoError::MalformedField(segment.to_string()))?;
            if values.insert(key, value).is_some() {
                return Err(MemoError::DuplicateField(key.to_string()));
            }
        }
        Ok(Self { values })
    }

    fn take(&mut self, key: &'static str) -> Option<&'a str> {
        self.values.remove(key)
    }

    fn required(&mut self, key: &'static str) -> Result<String, MemoError> {
        match self.take(key) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            Some(_) => Err(MemoError::InvalidValue {
                field: key,
                reason: "must not be empty".to_string(),
            }),
            None => Err(MemoError::MissingField(key)),
        }
    }

    fn trace_id(&mut self) -> Result<TraceId, MemoError> {
        self.required("trace").map(TraceId::new)
    }

    fn symbol(&mut self) -> Result<PairSymbol, MemoError> {
        let raw = self.required("symbol")?;
        PairSymbol::parse(&raw).map_err(|e| MemoError::InvalidValue {
            field: "symbol",
            reason: e.to_string(),
        })
    }

    fn side(&mut self) -> Result<Side, MemoError> {
        let raw = self.required("side")?;
        raw.parse().map_err(|reason| MemoError::InvalidValue {
            field: "side",
            reason,
        })
    }

    fn price(&mut self) -> Result<Option<Decimal>, MemoError> {
        let Some(raw) = self.take("price") else {
            return Ok(None);
        };
        let price: Decimal = raw.parse().map_err(|_| MemoError::InvalidValue {
            field: "price",
            reason: format!("'{raw}' is not a decimal"),
        })?;
        if price <= Decimal::ZERO {
            return Err(MemoError::InvalidValue {
                field: "price",
                reason: "must be positive".to_string(),
            });
        }
        Ok(Some(price))
    }
}
