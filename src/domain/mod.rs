//! Ledger-agnostic domain logic.

pub mod error;
pub mod id;
pub mod instruction;
pub mod memo;
pub mod order;
pub mod pair;
pub mod payment;
pub mod refund;
pub mod transfer;

pub use error::{DomainError, MemoError};
pub use id::{AssetId, TraceId, TransferId, TxId, UserId};
pub use instruction::{
    ArbitrageInstruction, Instruction, MarketMakingInstruction, Side, SpotInstruction,
    StrategyKind,
};
pub use order::{
    ArbitrageOrder, ArbitrageParams, Balance, MarketMakingOrder, MarketMakingParams, OrderState,
    PriceSource, StrategyOrder,
};
pub use pair::{AssetPair, PairSymbol};
pub use payment::{Leg, PaymentStage, PaymentState};
pub use refund::{RefundReason, RefundRecord, RefundStatus};
pub use transfer::{Disposition, ProcessedTransfer, Transfer};
