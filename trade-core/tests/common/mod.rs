//! Shared fixtures: in-test delegates and store seeding
#![allow(dead_code)]

use docstore::{CollectionRef, DocRef, DocStore, Query, RetryPolicy, Transaction};
use serde_json::{json, Value};
use trade_core::{
    paths, Currency, Error, FulfilledItem, Inventory, Order, OrderItem, OrderItemKind,
    PaymentDelegate, Result, Sku, Stock, StockType, StockValue, TradeDelegate, TransactionResult,
};
use uuid::Uuid;

/// Fulfillment delegate that materializes items under
/// `users/{buyer}/items/{id}`, mirroring a real fulfillment service.
pub struct TestTradeDelegate;

fn buyer_items(buyer: &str) -> CollectionRef {
    CollectionRef::new("users").doc(buyer).collection("items")
}

impl TradeDelegate for TestTradeDelegate {
    fn reserve(&self, _order: &Order, _item: &OrderItem, _tx: &Transaction) -> Result<()> {
        Ok(())
    }

    fn create_item(
        &self,
        order: &Order,
        item: &OrderItem,
        stock: Option<&DocRef>,
        tx: &Transaction,
    ) -> Result<DocRef> {
        let item_ref = buyer_items(&order.buyer).doc(Uuid::new_v4().to_string());
        tx.set(
            &item_ref,
            &json!({
                "seller": item.seller,
                "order": order.id,
                "sku": item.sku,
                "stock": stock,
                "is_cancelled": false,
            }),
        )?;
        Ok(item_ref)
    }

    fn get_items(
        &self,
        order: &Order,
        _item: &OrderItem,
        tx: &Transaction,
    ) -> Result<Vec<FulfilledItem>> {
        let items: Vec<(DocRef, Value)> =
            tx.query(&Query::new(buyer_items(&order.buyer)).filter("order", json!(order.id)))?;
        Ok(items
            .into_iter()
            .map(|(doc, data)| FulfilledItem {
                item: doc,
                stock: data
                    .get("stock")
                    .and_then(Value::as_str)
                    .map(DocRef::new),
            })
            .collect())
    }

    fn cancel_item(
        &self,
        _order: &Order,
        _item: &OrderItem,
        item_ref: &DocRef,
        tx: &Transaction,
    ) -> Result<()> {
        tx.merge(item_ref, json!({"is_cancelled": true}))?;
        Ok(())
    }
}

/// Payment delegate that answers every call with a canned gateway result.
pub struct TestPaymentDelegate;

fn gateway_result(call: &str) -> Result<TransactionResult> {
    Ok(json!({"gateway": "test", "call": call}))
}

impl PaymentDelegate for TestPaymentDelegate {
    fn authorize(
        &self,
        _currency: Currency,
        _amount: i64,
        _order: &Order,
        _options: &trade_core::delegate::PaymentOptions,
    ) -> Result<TransactionResult> {
        gateway_result("authorize")
    }

    fn authorize_cancel(
        &self,
        _currency: Currency,
        _amount: i64,
        _order: &Order,
        _options: &trade_core::delegate::PaymentOptions,
    ) -> Result<TransactionResult> {
        gateway_result("authorize_cancel")
    }

    fn charge(
        &self,
        _currency: Currency,
        _amount: i64,
        _order: &Order,
        _options: &trade_core::delegate::PaymentOptions,
    ) -> Result<TransactionResult> {
        gateway_result("charge")
    }

    fn refund(
        &self,
        _currency: Currency,
        _amount: i64,
        _order: &Order,
        _options: &trade_core::delegate::PaymentOptions,
        _reason: Option<&str>,
    ) -> Result<TransactionResult> {
        gateway_result("refund")
    }

    fn part_refund(
        &self,
        _currency: Currency,
        _amount: i64,
        _order: &Order,
        _item: &OrderItem,
        _options: &trade_core::delegate::PaymentOptions,
        _reason: Option<&str>,
    ) -> Result<TransactionResult> {
        gateway_result("part_refund")
    }

    fn transfer(
        &self,
        _currency: Currency,
        _amount: i64,
        _order: &Order,
        _to_account: &str,
        _options: &trade_core::delegate::TransferOptions,
    ) -> Result<TransactionResult> {
        gateway_result("transfer")
    }

    fn transfer_cancel(
        &self,
        _currency: Currency,
        _amount: i64,
        _order: &Order,
        _options: &trade_core::delegate::TransferOptions,
        _reason: Option<&str>,
    ) -> Result<TransactionResult> {
        gateway_result("transfer_cancel")
    }

    fn payout(
        &self,
        _currency: Currency,
        _amount: i64,
        _account: &str,
        _options: &trade_core::delegate::PayoutOptions,
    ) -> Result<TransactionResult> {
        gateway_result("payout")
    }

    fn payout_cancel(
        &self,
        _currency: Currency,
        _amount: i64,
        _account: &str,
        _options: &trade_core::delegate::PayoutOptions,
    ) -> Result<TransactionResult> {
        gateway_result("payout_cancel")
    }

    fn subscribe(
        &self,
        _account: &str,
        _options: &trade_core::delegate::PaymentOptions,
    ) -> Result<TransactionResult> {
        gateway_result("subscribe")
    }
}

/// Seed a finite SKU with `shards` available shard documents.
pub fn seed_finite_sku(store: &DocStore, id: &str, seller: &str, shards: u32) -> DocRef {
    let sku_ref = paths::sku(id);
    store
        .put(
            &sku_ref,
            &Sku {
                seller: seller.to_string(),
                created_by: seller.to_string(),
                product: None,
                currency: Currency::JPY,
                amount: 100,
                inventory: Inventory {
                    kind: StockType::Finite,
                    quantity: Some(shards),
                    value: None,
                },
                is_available: true,
                number_of_fetch: 2,
            },
        )
        .unwrap();
    for i in 0..shards {
        store
            .put(&paths::sku_stocks(&sku_ref).doc(i.to_string()), &Stock::available())
            .unwrap();
    }
    sku_ref
}

/// Seed an infinite or bucket SKU.
pub fn seed_unsharded_sku(
    store: &DocStore,
    id: &str,
    seller: &str,
    kind: StockType,
    value: Option<StockValue>,
) -> DocRef {
    let sku_ref = paths::sku(id);
    store
        .put(
            &sku_ref,
            &Sku {
                seller: seller.to_string(),
                created_by: seller.to_string(),
                product: None,
                currency: Currency::JPY,
                amount: 100,
                inventory: Inventory {
                    kind,
                    quantity: None,
                    value,
                },
                is_available: true,
                number_of_fetch: 2,
            },
        )
        .unwrap();
    sku_ref
}

/// Build a one-line order for `quantity` units of a SKU.
pub fn make_order(id: &str, buyer: &str, seller: &str, sku: &DocRef, quantity: u32) -> Order {
    Order {
        id: id.to_string(),
        buyer: buyer.to_string(),
        seller: seller.to_string(),
        currency: Currency::JPY,
        amount: 100 * quantity as i64,
        items: vec![OrderItem {
            buyer: buyer.to_string(),
            seller: seller.to_string(),
            kind: OrderItemKind::Sku,
            product: None,
            sku: Some(sku.clone()),
            quantity,
            currency: Currency::JPY,
            amount: 100,
            status: trade_core::types::OrderItemStatus::None,
        }],
        payment_status: trade_core::types::OrderPaymentStatus::None,
        transaction_results: vec![],
        is_cancelled: false,
    }
}

/// Committed shard documents of a SKU, split (available, unavailable).
pub fn shard_split(store: &DocStore, sku_ref: &DocRef) -> (Vec<DocRef>, Vec<(DocRef, Stock)>) {
    let mut available = Vec::new();
    let mut unavailable = Vec::new();
    let mut i = 0;
    loop {
        let doc = paths::sku_stocks(sku_ref).doc(i.to_string());
        let Some(stock) = store.get::<Stock>(&doc).unwrap() else {
            break;
        };
        if stock.is_available {
            available.push(doc);
        } else {
            unavailable.push((doc, stock));
        }
        i += 1;
    }
    (available, unavailable)
}

/// Run one transaction with default retries, unwrapping setup errors.
pub async fn in_tx<T, F, Fut>(store: &DocStore, f: F) -> std::result::Result<T, Error>
where
    F: Fn(Transaction) -> Fut,
    Fut: std::future::Future<Output = std::result::Result<T, Error>>,
{
    store.run(RetryPolicy::default(), f).await
}

/// All documents of one collection, read from committed state.
pub async fn collection_docs(store: &DocStore, collection: CollectionRef) -> Vec<(DocRef, Value)> {
    in_tx(store, |tx| {
        let collection = collection.clone();
        async move { Ok(tx.query(&Query::new(collection))?) }
    })
    .await
    .unwrap()
}
