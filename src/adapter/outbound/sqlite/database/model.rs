//! Database model types for Diesel ORM.
//!
//! Decimals are stored as TEXT to keep their exact scale; timestamps are
//! RFC 3339 strings.

use diesel::prelude::*;

use super::schema::{payment_states, processed_transfers, refunds, strategy_orders};

/// Database row for a processed-transfer marker.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = processed_transfers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProcessedTransferRow {
    pub transfer_id: String,
    pub disposition: String,
    pub processed_at: String,
}

/// Database row for a payment state.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = payment_states)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PaymentStateRow {
    pub trace_id: String,
    pub strategy: String,
    pub pair_symbol: String,
    /// JSON array of exchange names.
    pub venues: String,
    pub first_asset_id: String,
    pub first_amount: String,
    pub first_transfer_id: String,
    pub second_asset_id: Option<String>,
    pub second_amount: Option<String>,
    pub second_transfer_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Database row for a strategy order.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = strategy_orders)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StrategyOrderRow {
    pub order_id: String,
    pub strategy: String,
    pub pair_symbol: String,
    pub state: String,
    /// Full order as JSON.
    pub payload: String,
    pub created_at: String,
}

/// Database row for a refund record.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = refunds)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RefundRow {
    pub transfer_id: String,
    pub recipient_id: String,
    pub asset_id: String,
    pub amount: String,
    pub idempotency_key: String,
    pub reason: String,
    pub status: String,
    pub attempts: i32,
    pub tx_id: Option<String>,
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
