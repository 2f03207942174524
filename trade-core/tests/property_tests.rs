//! Property-based checks of the ledger and allocator invariants

mod common;

use common::*;
use docstore::DocStore;
use proptest::prelude::*;
use serde_json::Value;
use std::sync::Arc;
use trade_core::{paths, Account, BalanceManager, Currency, Error, Party, StockManager};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Available balance always equals the signed sum of the account's
    /// balance transactions, whatever order operations arrive in.
    #[test]
    fn prop_available_balance_is_signed_sum(
        ops in proptest::collection::vec((0u8..4, 1i64..1_000), 1..20),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut expected = 0i64;
        let (actual, log_len) = rt.block_on(async {
            let store = DocStore::new();
            let ledger = BalanceManager::new();
            for &(kind, amount) in &ops {
                in_tx(&store, |tx| async move {
                    match kind {
                        0 => ledger.payout("acct", Currency::JPY, amount, Value::Null, &tx),
                        1 => ledger.payout_cancel("acct", Currency::JPY, amount, Value::Null, &tx),
                        2 => ledger.transfer(
                            Party::Platform,
                            Party::from("acct"),
                            "order-1",
                            Currency::JPY,
                            amount,
                            Value::Null,
                            &tx,
                        ),
                        _ => ledger.transfer(
                            Party::from("acct"),
                            Party::Platform,
                            "order-1",
                            Currency::JPY,
                            amount,
                            Value::Null,
                            &tx,
                        ),
                    }
                })
                .await
                .unwrap();
            }
            let account: Account = store
                .get(&paths::account("acct"))
                .unwrap()
                .unwrap_or_default();
            let log = collection_docs(
                &store,
                docstore::CollectionRef::new("accounts")
                    .doc("acct")
                    .collection("balance_transactions"),
            )
            .await;
            (account.balance.available_for(Currency::JPY), log.len())
        });
        for &(kind, amount) in &ops {
            expected += match kind {
                1 | 2 => amount,
                _ => -amount,
            };
        }
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(log_len, ops.len());
    }

    /// A single-line allocation succeeds exactly when enough shards are
    /// available, and consumes exactly the requested quantity.
    #[test]
    fn prop_allocation_consumes_exactly_quantity(shards in 0u32..6, quantity in 1u32..4) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (result, available, unavailable) = rt.block_on(async {
            let store = DocStore::new();
            let sku_ref = seed_finite_sku(&store, "sku-1", "alice", shards);
            let order = make_order("order-1", "bob", "alice", &sku_ref, quantity);
            let manager = StockManager::new(Arc::new(TestTradeDelegate), 2);

            let result = in_tx(&store, |tx| {
                let order = order.clone();
                let manager = &manager;
                async move {
                    let plan = manager.trade_item(&order, &order.items[0], &tx).await?;
                    plan.commit(&tx)?;
                    Ok(())
                }
            })
            .await;
            let (available, unavailable) = shard_split(&store, &sku_ref);
            (result, available.len(), unavailable.len())
        });

        if quantity <= shards {
            prop_assert!(result.is_ok());
            prop_assert_eq!(unavailable, quantity as usize);
            prop_assert_eq!(available, (shards - quantity) as usize);
        } else {
            prop_assert!(matches!(result, Err(Error::OutOfStock(_))));
            prop_assert_eq!(available, shards as usize);
            prop_assert_eq!(unavailable, 0);
        }
    }
}
