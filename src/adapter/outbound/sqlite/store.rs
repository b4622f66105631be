//! SQLite store implementation.
//!
//! Implements every persistence port on one connection pool. Writes that
//! guard against double effects are single conditional statements.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use rust_decimal::Decimal;

use super::database::connection::DbPool;
use super::database::model::{
    PaymentStateRow, ProcessedTransferRow, RefundRow, StrategyOrderRow,
};
use super::database::schema::{payment_states, processed_transfers, refunds, strategy_orders};
use crate::domain::{
    ArbitrageOrder, AssetId, Leg, MarketMakingOrder, PairSymbol, PaymentState, ProcessedTransfer,
    RefundRecord, RefundStatus, StrategyOrder, TraceId, TransferId, TxId, UserId,
};
use crate::error::{Error, Result};
use crate::port::{OrderStore, PaymentStore, RefundStore, SnapshotLedger};

type Conn = PooledConnection<ConnectionManager<diesel::SqliteConnection>>;

/// SQLite-backed store for markers, payment states, orders and refunds.
pub struct SqliteStore {
    /// Database connection pool.
    pool: DbPool,
}

impl SqliteStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<Conn> {
        self.pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))
    }

    fn payment_to_row(state: &PaymentState) -> Result<PaymentStateRow> {
        let venues = serde_json::to_string(&state.venues)?;
        Ok(PaymentStateRow {
            trace_id: state.order_id.to_string(),
            strategy: state.strategy.as_str().to_string(),
            pair_symbol: state.pair_symbol.to_string(),
            venues,
            first_asset_id: state.first.asset_id.to_string(),
            first_amount: state.first.amount.to_string(),
            first_transfer_id: state.first.transfer_id.to_string(),
            second_asset_id: state.second.as_ref().map(|l| l.asset_id.to_string()),
            second_amount: state.second.as_ref().map(|l| l.amount.to_string()),
            second_transfer_id: state.second.as_ref().map(|l| l.transfer_id.to_string()),
            created_at: state.created_at.to_rfc3339(),
            updated_at: state.updated_at.to_rfc3339(),
        })
    }

    fn payment_from_row(row: PaymentStateRow) -> Result<PaymentState> {
        let second = match (row.second_asset_id, row.second_amount, row.second_transfer_id) {
            (Some(asset_id), Some(amount), Some(transfer_id)) => Some(Leg {
                asset_id: AssetId::from(asset_id),
                amount: parse_decimal(&amount)?,
                transfer_id: TransferId::from(transfer_id),
            }),
            (None, None, None) => None,
            _ => {
                return Err(Error::Parse(format!(
                    "payment state {} has a partial second leg",
                    row.trace_id
                )))
            }
        };

        Ok(PaymentState {
            strategy: row.strategy.parse().map_err(Error::Parse)?,
            pair_symbol: PairSymbol::parse(&row.pair_symbol)?,
            venues: serde_json::from_str(&row.venues)?,
            first: Leg {
                asset_id: AssetId::from(row.first_asset_id),
                amount: parse_decimal(&row.first_amount)?,
                transfer_id: TransferId::from(row.first_transfer_id),
            },
            created_at: parse_time(&row.created_at)?,
            second,
            updated_at: parse_time(&row.updated_at)?,
            order_id: TraceId::from(row.trace_id),
        })
    }

    fn order_to_row(order: &StrategyOrder, created_at: DateTime<Utc>) -> Result<StrategyOrderRow> {
        let payload = serde_json::to_string(order)?;
        Ok(StrategyOrderRow {
            order_id: order.order_id().to_string(),
            strategy: order.kind().as_str().to_string(),
            pair_symbol: order.pair_symbol().to_string(),
            state: order.state().as_str().to_string(),
            payload,
            created_at: created_at.to_rfc3339(),
        })
    }

    fn insert_order(&self, order: &StrategyOrder, created_at: DateTime<Utc>) -> Result<bool> {
        let row = Self::order_to_row(order, created_at)?;
        let mut conn = self.conn()?;
        let inserted = diesel::insert_or_ignore_into(strategy_orders::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(inserted > 0)
    }

    fn refund_to_row(record: &RefundRecord) -> Result<RefundRow> {
        let attempts = i32::try_from(record.attempts)
            .map_err(|e| Error::Parse(format!("refund attempts out of range: {e}")))?;
        Ok(RefundRow {
            transfer_id: record.transfer_id.to_string(),
            recipient_id: record.recipient_id.to_string(),
            asset_id: record.asset_id.to_string(),
            amount: record.amount.to_string(),
            idempotency_key: record.idempotency_key.clone(),
            reason: record.reason.as_str().to_string(),
            status: record.status.as_str().to_string(),
            attempts,
            tx_id: record.tx_id.as_ref().map(ToString::to_string),
            last_error: record.last_error.clone(),
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        })
    }

    fn refund_from_row(row: RefundRow) -> Result<RefundRecord> {
        Ok(RefundRecord {
            amount: parse_decimal(&row.amount)?,
            reason: row.reason.parse().map_err(Error::Parse)?,
            status: row.status.parse().map_err(Error::Parse)?,
            attempts: u32::try_from(row.attempts)
                .map_err(|e| Error::Parse(format!("negative refund attempts: {e}")))?,
            created_at: parse_time(&row.created_at)?,
            updated_at: parse_time(&row.updated_at)?,
            transfer_id: TransferId::from(row.transfer_id),
            recipient_id: UserId::from(row.recipient_id),
            asset_id: AssetId::from(row.asset_id),
            idempotency_key: row.idempotency_key,
            tx_id: row.tx_id.map(TxId::from),
            last_error: row.last_error,
        })
    }
}

fn parse_decimal(value: &str) -> Result<Decimal> {
    Decimal::from_str(value).map_err(|e| Error::Parse(format!("invalid decimal '{value}': {e}")))
}

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Parse(format!("invalid timestamp '{value}': {e}")))
}

fn retryable_statuses() -> Vec<&'static str> {
    vec![RefundStatus::Pending.as_str(), RefundStatus::Failed.as_str()]
}

#[async_trait]
impl SnapshotLedger for SqliteStore {
    async fn is_processed(&self, transfer_id: &TransferId) -> Result<bool> {
        let mut conn = self.conn()?;
        let count: i64 = processed_transfers::table
            .filter(processed_transfers::transfer_id.eq(transfer_id.as_str()))
            .count()
            .get_result(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count > 0)
    }

    async fn mark_processed(&self, marker: &ProcessedTransfer) -> Result<()> {
        let row = ProcessedTransferRow {
            transfer_id: marker.transfer_id.to_string(),
            disposition: marker.disposition.as_str().to_string(),
            processed_at: marker.processed_at.to_rfc3339(),
        };
        let mut conn = self.conn()?;
        diesel::insert_or_ignore_into(processed_transfers::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl PaymentStore for SqliteStore {
    async fn get_payment_state(&self, trace_id: &TraceId) -> Result<Option<PaymentState>> {
        let mut conn = self.conn()?;
        let row: Option<PaymentStateRow> = payment_states::table
            .find(trace_id.as_str())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        row.map(Self::payment_from_row).transpose()
    }

    async fn put_payment_state(&self, state: &PaymentState) -> Result<bool> {
        let row = Self::payment_to_row(state)?;
        let mut conn = self.conn()?;
        let inserted = diesel::insert_or_ignore_into(payment_states::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(inserted > 0)
    }

    async fn update_payment_state_leg2(
        &self,
        trace_id: &TraceId,
        leg: &Leg,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            payment_states::table
                .filter(payment_states::trace_id.eq(trace_id.as_str()))
                .filter(payment_states::second_transfer_id.is_null()),
        )
        .set((
            payment_states::second_asset_id.eq(Some(leg.asset_id.to_string())),
            payment_states::second_amount.eq(Some(leg.amount.to_string())),
            payment_states::second_transfer_id.eq(Some(leg.transfer_id.to_string())),
            payment_states::updated_at.eq(updated_at.to_rfc3339()),
        ))
        .execute(&mut conn)
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(updated > 0)
    }
}

#[async_trait]
impl OrderStore for SqliteStore {
    async fn create_arbitrage_order(&self, order: &ArbitrageOrder) -> Result<bool> {
        self.insert_order(&StrategyOrder::Arbitrage(order.clone()), order.created_at)
    }

    async fn create_market_making_order(&self, order: &MarketMakingOrder) -> Result<bool> {
        self.insert_order(&StrategyOrder::MarketMaking(order.clone()), order.created_at)
    }

    async fn order_exists(&self, order_id: &TraceId) -> Result<bool> {
        let mut conn = self.conn()?;
        let count: i64 = strategy_orders::table
            .filter(strategy_orders::order_id.eq(order_id.as_str()))
            .count()
            .get_result(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count > 0)
    }

    async fn get_order(&self, order_id: &TraceId) -> Result<Option<StrategyOrder>> {
        let mut conn = self.conn()?;
        let row: Option<StrategyOrderRow> = strategy_orders::table
            .find(order_id.as_str())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        row.map(|r| serde_json::from_str(&r.payload).map_err(Error::from))
            .transpose()
    }
}

#[async_trait]
impl RefundStore for SqliteStore {
    async fn get_refund(&self, transfer_id: &TransferId) -> Result<Option<RefundRecord>> {
        let mut conn = self.conn()?;
        let row: Option<RefundRow> = refunds::table
            .find(transfer_id.as_str())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        row.map(Self::refund_from_row).transpose()
    }

    async fn upsert_refund(&self, record: &RefundRecord) -> Result<()> {
        let row = Self::refund_to_row(record)?;
        let mut conn = self.conn()?;
        diesel::replace_into(refunds::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn list_retryable_refunds(
        &self,
        max_attempts: u32,
        limit: usize,
    ) -> Result<Vec<RefundRecord>> {
        let max_attempts = i32::try_from(max_attempts).unwrap_or(i32::MAX);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut conn = self.conn()?;
        let rows: Vec<RefundRow> = refunds::table
            .filter(refunds::status.eq_any(retryable_statuses()))
            .filter(refunds::attempts.lt(max_attempts))
            .order(refunds::created_at.asc())
            .limit(limit)
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter().map(Self::refund_from_row).collect()
    }

    async fn count_stuck_refunds(&self, max_attempts: u32) -> Result<usize> {
        let max_attempts = i32::try_from(max_attempts).unwrap_or(i32::MAX);
        let mut conn = self.conn()?;
        let count: i64 = refunds::table
            .filter(refunds::status.eq(RefundStatus::Failed.as_str()))
            .filter(refunds::attempts.ge(max_attempts))
            .count()
            .get_result(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};
    use crate::domain::{Disposition, RefundReason, StrategyKind};
    use crate::testkit::fixtures::transfer;
    use rust_decimal_macros::dec;

    fn store() -> SqliteStore {
        let pool = create_pool(":memory:").unwrap();
        run_migrations(&pool).unwrap();
        SqliteStore::new(pool)
    }

    fn leg(asset: &str, amount: Decimal, transfer: &str) -> Leg {
        Leg {
            asset_id: AssetId::new(asset),
            amount,
            transfer_id: TransferId::new(transfer),
        }
    }

    fn open_state(trace: &str) -> PaymentState {
        PaymentState::open(
            TraceId::new(trace),
            StrategyKind::Arbitrage,
            PairSymbol::parse("BTC/USDT").unwrap(),
            vec!["binance".into(), "4swap".into()],
            leg("btc", dec!(0.10000000), "1"),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn processed_marker_keeps_first_write() {
        let store = store();
        let id = TransferId::new("t-1");
        assert!(!store.is_processed(&id).await.unwrap());

        for disposition in [Disposition::LegRecorded, Disposition::Ignored] {
            store
                .mark_processed(&ProcessedTransfer {
                    transfer_id: id.clone(),
                    disposition,
                    processed_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        assert!(store.is_processed(&id).await.unwrap());
    }

    #[tokio::test]
    async fn payment_state_round_trips_exact_decimals() {
        let store = store();
        let state = open_state("X");

        assert!(store.put_payment_state(&state).await.unwrap());
        let loaded = store
            .get_payment_state(&TraceId::new("X"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(loaded.first.amount.to_string(), "0.10000000");
        assert_eq!(loaded.venues, state.venues);
        assert_eq!(loaded.strategy, StrategyKind::Arbitrage);
        assert!(loaded.second.is_none());
    }

    #[tokio::test]
    async fn put_payment_state_does_not_overwrite() {
        let store = store();
        assert!(store.put_payment_state(&open_state("X")).await.unwrap());
        assert!(!store.put_payment_state(&open_state("X")).await.unwrap());
    }

    #[tokio::test]
    async fn leg2_update_applies_once() {
        let store = store();
        store.put_payment_state(&open_state("X")).await.unwrap();
        let trace = TraceId::new("X");

        let first = store
            .update_payment_state_leg2(&trace, &leg("usdt", dec!(2500), "2"), Utc::now())
            .await
            .unwrap();
        let second = store
            .update_payment_state_leg2(&trace, &leg("usdt", dec!(9999), "3"), Utc::now())
            .await
            .unwrap();

        assert!(first);
        assert!(!second);
        let loaded = store.get_payment_state(&trace).await.unwrap().unwrap();
        let completed = loaded.second.unwrap();
        assert_eq!(completed.amount, dec!(2500));
        assert_eq!(completed.transfer_id, TransferId::new("2"));
    }

    #[tokio::test]
    async fn leg2_update_on_missing_state_is_not_applied() {
        let store = store();
        let applied = store
            .update_payment_state_leg2(
                &TraceId::new("missing"),
                &leg("usdt", dec!(1), "2"),
                Utc::now(),
            )
            .await
            .unwrap();
        assert!(!applied);
    }

    #[tokio::test]
    async fn orders_are_unique_per_trace() {
        let store = store();
        store.put_payment_state(&open_state("X")).await.unwrap();
        let state = open_state("X")
            .with_second_leg(leg("usdt", dec!(2500), "2"), Utc::now())
            .unwrap();
        let factory = crate::application::StrategyOrderFactory::default();
        let order = factory.create_arbitrage_order(&state, Utc::now()).unwrap();

        assert!(store.create_arbitrage_order(&order).await.unwrap());
        assert!(!store.create_arbitrage_order(&order).await.unwrap());
        assert!(store.order_exists(&TraceId::new("X")).await.unwrap());

        let loaded = store.get_order(&TraceId::new("X")).await.unwrap().unwrap();
        assert_eq!(loaded, StrategyOrder::Arbitrage(order));
    }

    #[tokio::test]
    async fn refunds_are_listed_until_sent_or_exhausted() {
        let store = store();
        let t = transfer("r-1", "alice", "eth", dec!(1.5), "");
        let mut record = RefundRecord::pending(&t, RefundReason::AssetMismatch, Utc::now());
        store.upsert_refund(&record).await.unwrap();

        assert_eq!(store.list_retryable_refunds(2, 10).await.unwrap().len(), 1);

        record.mark_failed("timeout", Utc::now());
        record.mark_failed("timeout", Utc::now());
        store.upsert_refund(&record).await.unwrap();

        assert!(store.list_retryable_refunds(2, 10).await.unwrap().is_empty());
        assert_eq!(store.count_stuck_refunds(2).await.unwrap(), 1);

        record.mark_sent(TxId::new("tx-1"), Utc::now());
        store.upsert_refund(&record).await.unwrap();
        assert_eq!(store.count_stuck_refunds(2).await.unwrap(), 0);

        let loaded = store.get_refund(&t.transfer_id).await.unwrap().unwrap();
        assert_eq!(loaded.status, RefundStatus::Sent);
        assert_eq!(loaded.attempts, 3);
        assert_eq!(loaded.tx_id, Some(TxId::new("tx-1")));
    }
}
