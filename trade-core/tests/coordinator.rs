//! End-to-end coordinator behaviour: delegate wiring, atomicity, checkout

mod common;

use common::*;
use docstore::{CollectionRef, DocStore};
use serde_json::{json, Value};
use std::sync::Arc;
use trade_core::{
    paths, Account, Config, Currency, Error, Manager, Order, TradeTransaction,
};

fn manager_with_delegates(store: &DocStore) -> Manager {
    let mut manager = Manager::new(store.clone(), Config::default());
    manager.set_payment_delegate(Arc::new(TestPaymentDelegate));
    manager.set_trade_delegate(Arc::new(TestTradeDelegate));
    manager
}

fn seed_order(store: &DocStore, order: &Order) {
    store.put(&paths::order(&order.id), order).unwrap();
}

#[tokio::test]
async fn test_missing_delegates_fail_fast() {
    let store = DocStore::new();
    let sku_ref = seed_finite_sku(&store, "sku-1", "alice", 1);
    let order = make_order("order-1", "bob", "alice", &sku_ref, 1);
    seed_order(&store, &order);
    let order_ref = paths::order("order-1");

    let manager = Manager::new(store.clone(), Config::default());
    let result = manager
        .run_transaction(&order_ref, (), |_, _, _| async { Ok(()) })
        .await;
    match result {
        Err(Error::InvalidArgument(message)) => assert!(message.contains("payment delegate")),
        other => panic!("expected InvalidArgument, got {other:?}"),
    }

    let mut manager = Manager::new(store.clone(), Config::default());
    manager.set_payment_delegate(Arc::new(TestPaymentDelegate));
    let result = manager
        .run_transaction(&order_ref, (), |_, _, _| async { Ok(()) })
        .await;
    match result {
        Err(Error::InvalidArgument(message)) => assert!(message.contains("trade delegate")),
        other => panic!("expected InvalidArgument, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_order_is_rejected() {
    let store = DocStore::new();
    let manager = manager_with_delegates(&store);

    let result = manager
        .run_transaction(&paths::order("missing"), (), |_, _, _| async { Ok(()) })
        .await;
    match result {
        Err(Error::InvalidArgument(message)) => assert!(message.contains("unknown order")),
        other => panic!("expected InvalidArgument, got {other:?}"),
    }
}

#[tokio::test]
async fn test_step_error_aborts_all_writes() {
    let store = DocStore::new();
    let sku_ref = seed_finite_sku(&store, "sku-1", "alice", 2);
    let order = make_order("order-1", "bob", "alice", &sku_ref, 1);
    seed_order(&store, &order);
    let manager = manager_with_delegates(&store);
    let stock = manager.stock_manager().unwrap();

    let result: Result<(), Error> = manager
        .run_transaction(&paths::order("order-1"), (), |order, (), tx| {
            let stock = &stock;
            async move {
                let plan = stock.trade_item(&order, &order.items[0], &tx).await?;
                plan.commit(&tx)?;
                Err(Error::Internal("gateway unreachable".to_string()))
            }
        })
        .await;
    assert!(matches!(result, Err(Error::Internal(_))));

    // The failed step staged shard claims and trade records; none survive.
    let (available, unavailable) = shard_split(&store, &sku_ref);
    assert_eq!(available.len(), 2);
    assert!(unavailable.is_empty());
    let log = collection_docs(&store, CollectionRef::new("trade_transactions")).await;
    assert!(log.is_empty());
}

#[tokio::test]
async fn test_checkout_happy_path() {
    let store = DocStore::new();
    let sku_ref = seed_finite_sku(&store, "sku-1", "alice", 3);
    let order = make_order("order-1", "bob", "alice", &sku_ref, 2);
    seed_order(&store, &order);
    let manager = manager_with_delegates(&store);
    let stock = manager.stock_manager().unwrap();
    let ledger = *manager.balance_manager();
    let orders = *manager.order_manager();
    let payment = manager.payment_delegate().unwrap();

    let options = trade_core::delegate::PaymentOptions::default();
    manager
        .run_transaction(&paths::order("order-1"), options, |order, options, tx| {
            let stock = &stock;
            let payment = payment.clone();
            async move {
                let plans = stock.trade(&order, &tx).await?;

                let result = payment.charge(order.currency, order.amount, &order, &options)?;

                for plan in &plans {
                    plan.commit(&tx)?;
                }
                ledger.charge(
                    &order.buyer,
                    &order.id,
                    order.currency,
                    order.amount,
                    result.clone(),
                    &tx,
                )?;
                orders.update(&order, json!({"payment_status": "paid"}), result, &tx)?;
                Ok(())
            }
        })
        .await
        .unwrap();

    // Two shards claimed, two trade records fanned out.
    let (available, unavailable) = shard_split(&store, &sku_ref);
    assert_eq!(available.len(), 1);
    assert_eq!(unavailable.len(), 2);
    let log = collection_docs(&store, CollectionRef::new("trade_transactions")).await;
    assert_eq!(log.len(), 2);
    for (_, data) in &log {
        let record: TradeTransaction = serde_json::from_value(data.clone()).unwrap();
        assert_eq!(record.order, "order-1");
    }

    // One payment record carrying the gateway result; no balance moved.
    let payments = collection_docs(&store, CollectionRef::new("balance_transactions")).await;
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].1["transaction_results"][0]["call"], "charge");
    assert_eq!(
        store
            .get::<Account>(&paths::account("bob"))
            .unwrap()
            .unwrap_or_default()
            .balance
            .available_for(Currency::JPY),
        0
    );

    // All three order copies agree on the new payment status.
    for doc in [
        paths::order("order-1"),
        paths::user_order("bob", "order-1"),
        paths::user_received_order("alice", "order-1"),
    ] {
        let copy: Value = store.get(&doc).unwrap().unwrap();
        assert_eq!(copy["payment_status"], "paid");
        assert_eq!(copy["transaction_results"][0]["call"], "charge");
    }
}
