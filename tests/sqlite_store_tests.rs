mod harness;

use std::sync::Arc;

use chrono::Utc;
use rust_decimal_macros::dec;
use snapsettle::domain::{
    Disposition, Leg, PairSymbol, PaymentState, ProcessedTransfer, RefundReason, RefundRecord,
    RefundStatus, StrategyKind, StrategyOrder, TraceId, TransferId, TxId,
};
use snapsettle::port::{OrderStore, PaymentStore, RefundStore, SnapshotLedger};
use snapsettle::testkit::fixtures::{arbitrage_memo, market_making_memo, spot_memo, transfer};

use harness::pipeline::Harness;
use harness::temp_db::TempDb;

#[tokio::test]
async fn pipeline_on_sqlite_pairs_legs_into_one_order() {
    let db = TempDb::create("pipeline");
    let h = Harness::new(Arc::new(db.store()));
    let memo = market_making_memo("M", "BTC/USDT");

    let report = h
        .cycle(vec![
            transfer("1", "alice", "btc", dec!(0.5), &memo),
            transfer("2", "alice", "usdt", dec!(12000.25), &memo),
        ])
        .await;

    assert_eq!(report.legs_recorded, 1);
    assert_eq!(report.orders_created, 1);

    let order = h.store.get_order(&TraceId::new("M")).await.unwrap();
    let Some(StrategyOrder::MarketMaking(order)) = order else {
        panic!("expected market-making order, got {order:?}");
    };
    assert_eq!(order.exchange, "mixswap");
    let mut amounts = [order.balance_a.amount, order.balance_b.amount];
    amounts.sort();
    assert_eq!(amounts, [dec!(0.5), dec!(12000.25)]);
}

#[tokio::test]
async fn state_survives_a_restart() {
    let db = TempDb::create("restart");
    let memo = arbitrage_memo("X", "BTC/USDT");
    let first = transfer("1", "alice", "btc", dec!(0.1), &memo);

    {
        let h = Harness::new(Arc::new(db.store()));
        let report = h.cycle(vec![first.clone()]).await;
        assert_eq!(report.legs_recorded, 1);
    }

    let h = Harness::new(Arc::new(db.store()));
    let report = h
        .cycle(vec![
            first,
            transfer("2", "alice", "usdt", dec!(2500), &memo),
        ])
        .await;

    assert_eq!(report.skipped_processed, 1);
    assert_eq!(report.orders_created, 1);
}

#[tokio::test]
async fn failed_refund_is_retried_after_restart() {
    let db = TempDb::create("refund-retry");
    let memo = spot_memo("S", "BTC/USDT");

    {
        let h = Harness::new(Arc::new(db.store()));
        h.ledger.fail_next_refunds(1);
        let report = h
            .cycle(vec![transfer("1", "bob", "eth", dec!(1), &memo)])
            .await;
        assert_eq!(report.refund_failed, 1);
    }

    let h = Harness::new(Arc::new(db.store()));
    let report = h.cycle(vec![]).await;
    assert_eq!(report.refunds_retried, 1);

    let record = h
        .store
        .get_refund(&TransferId::new("1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, RefundStatus::Sent);
    assert_eq!(record.reason, RefundReason::AssetMismatch);
    assert_eq!(record.attempts, 2);
    assert!(record.tx_id.is_some());
}

#[tokio::test]
async fn leg2_update_applies_once() {
    let db = TempDb::create("leg2");
    let store = db.store();
    let trace = TraceId::new("X");
    let leg = |id: &str| Leg {
        asset_id: "btc".into(),
        amount: dec!(1),
        transfer_id: TransferId::new(id),
    };
    let state = PaymentState::open(
        trace.clone(),
        StrategyKind::Arbitrage,
        PairSymbol::parse("BTC/USDT").unwrap(),
        vec!["binance".into(), "4swap".into()],
        leg("1"),
        Utc::now(),
    );

    assert!(store.put_payment_state(&state).await.unwrap());
    assert!(!store.put_payment_state(&state).await.unwrap());
    assert!(store
        .update_payment_state_leg2(&trace, &leg("2"), Utc::now())
        .await
        .unwrap());
    assert!(!store
        .update_payment_state_leg2(&trace, &leg("3"), Utc::now())
        .await
        .unwrap());

    let stored = store.get_payment_state(&trace).await.unwrap().unwrap();
    assert_eq!(stored.first.transfer_id, TransferId::new("1"));
    assert_eq!(stored.second.unwrap().transfer_id, TransferId::new("2"));
    assert_eq!(stored.venues, vec!["binance".to_string(), "4swap".to_string()]);
}

#[tokio::test]
async fn processed_marker_keeps_first_disposition() {
    let db = TempDb::create("markers");
    let store = db.store();
    let transfer_id = TransferId::new("t-1");

    for disposition in [Disposition::Refunded, Disposition::Ignored] {
        store
            .mark_processed(&ProcessedTransfer {
                transfer_id: transfer_id.clone(),
                disposition,
                processed_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    assert!(store.is_processed(&transfer_id).await.unwrap());
    assert!(!store.is_processed(&TransferId::new("t-2")).await.unwrap());
}

#[tokio::test]
async fn stuck_refunds_are_counted_not_listed() {
    let db = TempDb::create("stuck");
    let store = db.store();
    let now = Utc::now();

    let mut stuck = RefundRecord::pending(
        &transfer("1", "bob", "eth", dec!(1), ""),
        RefundReason::AssetMismatch,
        now,
    );
    for _ in 0..3 {
        stuck.mark_failed("timeout", now);
    }
    let mut sent = RefundRecord::pending(
        &transfer("2", "bob", "eth", dec!(1), ""),
        RefundReason::AssetMismatch,
        now,
    );
    sent.mark_sent(TxId::new("tx-1"), now);
    let pending = RefundRecord::pending(
        &transfer("3", "bob", "eth", dec!(1), ""),
        RefundReason::UnknownPair,
        now,
    );

    for record in [&stuck, &sent, &pending] {
        store.upsert_refund(record).await.unwrap();
    }

    let retryable = store.list_retryable_refunds(3, 10).await.unwrap();
    assert_eq!(retryable.len(), 1);
    assert_eq!(retryable[0].transfer_id, TransferId::new("3"));
    assert_eq!(store.count_stuck_refunds(3).await.unwrap(), 1);
}
