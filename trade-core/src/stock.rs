//! Inventory allocator
//!
//! Reserves, trades, and releases sharded stock for finite SKUs. Every
//! public operation splits into a read phase that loads SKU and shard
//! candidates under the enclosing transaction, and an explicit plan whose
//! `commit` issues all writes, so the substrate's reads-before-writes
//! contract holds even when several order lines share one transaction.
//!
//! Shard selection oversamples: up to `number_of_fetch x quantity`
//! available candidates are queried, then exactly `quantity` picks are
//! drawn uniformly at random without replacement, each re-fetched
//! individually inside the transaction. Two concurrent allocations
//! therefore rarely touch the same shard, and when they do, the version
//! check on the re-fetched shard aborts one of them instead of
//! double-allocating.

use crate::{
    delegate::TradeDelegate,
    error::{Error, Result},
    paths,
    types::{
        Order, OrderItem, OrderItemKind, Sku, Stock, StockType, StockValue, TradeKind,
        TradeTransaction,
    },
};
use chrono::Utc;
use docstore::{DocRef, Query, Transaction};
use futures_util::future::try_join_all;
use rand::Rng;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Inventory allocator
pub struct StockManager {
    delegate: Arc<dyn TradeDelegate>,
    default_number_of_fetch: u32,
}

impl StockManager {
    /// Create an allocator around a fulfillment delegate
    pub fn new(delegate: Arc<dyn TradeDelegate>, default_number_of_fetch: u32) -> Self {
        Self {
            delegate,
            default_number_of_fetch,
        }
    }

    /// Soft pre-check of one order line; consumes no inventory.
    pub async fn reserve(&self, order: &Order, item: &OrderItem, tx: &Transaction) -> Result<()> {
        let Some(sku_ref) = &item.sku else {
            return Ok(());
        };
        let sku = self.load_sku(&order.id, sku_ref, tx)?;
        if !sku.is_available {
            return Err(Error::OutOfStock(format!(
                "order {}: sku {} is not available",
                order.id, sku_ref
            )));
        }
        self.delegate.reserve(order, item, tx)
    }

    /// Allocate every sku-typed line of an order concurrently.
    ///
    /// Returns one plan per line; nothing is observable until each plan's
    /// `commit` runs.
    pub async fn trade(&self, order: &Order, tx: &Transaction) -> Result<Vec<AllocationPlan>> {
        let mut tasks = Vec::new();
        for item in &order.items {
            if item.kind != OrderItemKind::Sku {
                continue;
            }
            if item.sku.is_none() {
                return Err(Error::InvalidArgument(format!(
                    "order {}: sku order item without sku reference",
                    order.id
                )));
            }
            tasks.push(self.trade_item(order, item, tx));
        }
        try_join_all(tasks).await
    }

    /// Allocate one order line: load the SKU, select shard candidates,
    /// and return the deferred commit plan.
    pub async fn trade_item(
        &self,
        order: &Order,
        item: &OrderItem,
        tx: &Transaction,
    ) -> Result<AllocationPlan> {
        let sku_ref = item.sku.clone().ok_or_else(|| {
            Error::InvalidArgument(format!(
                "order {}: sku order item without sku reference",
                order.id
            ))
        })?;
        let sku = self.load_sku(&order.id, &sku_ref, tx)?;
        if !sku.is_available {
            return Err(Error::OutOfStock(format!(
                "order {}: sku {} is not available",
                order.id, sku_ref
            )));
        }

        let quantity = item.quantity;
        let mut stocks = Vec::new();

        if sku.inventory.kind == StockType::Finite {
            let factor = if sku.number_of_fetch > 0 {
                sku.number_of_fetch
            } else {
                self.default_number_of_fetch
            };
            let window = (factor * quantity) as usize;
            let candidates: Vec<(DocRef, Stock)> = tx.query(
                &Query::new(paths::sku_stocks(&sku_ref))
                    .filter("is_available", json!(true))
                    .limit(window),
            )?;
            if candidates.len() < quantity as usize {
                return Err(Error::OutOfStock(format!(
                    "order {}: sku {} has {} available shards, {} requested",
                    order.id,
                    sku_ref,
                    candidates.len(),
                    quantity
                )));
            }

            // Sequential picks: each pick shrinks the pool the next one
            // draws from.
            let mut pool: Vec<DocRef> = candidates.into_iter().map(|(doc, _)| doc).collect();
            let mut rng = rand::thread_rng();
            for _ in 0..quantity {
                if pool.is_empty() {
                    return Err(Error::OutOfStock(format!(
                        "order {}: sku {} shard candidates exhausted",
                        order.id, sku_ref
                    )));
                }
                let picked = pool.swap_remove(rng.gen_range(0..pool.len()));
                let stock: Stock = tx.get(&picked)?.ok_or_else(|| {
                    Error::InvalidShard(format!(
                        "order {}: shard {} disappeared during selection",
                        order.id, picked
                    ))
                })?;
                stocks.push((picked, stock));
            }
        }

        tracing::debug!(
            order = %order.id,
            sku = %sku_ref,
            quantity,
            candidates = stocks.len(),
            "allocation planned"
        );

        Ok(AllocationPlan {
            delegate: self.delegate.clone(),
            order: order.clone(),
            item: item.clone(),
            sku_ref,
            stock_kind: sku.inventory.kind,
            stock_value: sku.inventory.value,
            quantity,
            stocks,
        })
    }

    /// Release every fulfilled item of one order line.
    pub async fn cancel(
        &self,
        order: &Order,
        item: &OrderItem,
        tx: &Transaction,
    ) -> Result<ReleasePlan> {
        let sku_ref = item.sku.clone().ok_or_else(|| {
            Error::InvalidArgument(format!(
                "order {}: cancel requires a sku reference",
                order.id
            ))
        })?;
        let sku = self.load_sku(&order.id, &sku_ref, tx)?;
        let items = self.delegate.get_items(order, item, tx)?;

        Ok(ReleasePlan {
            delegate: self.delegate.clone(),
            kind: TradeKind::OrderCancel,
            order: order.clone(),
            item: item.clone(),
            sku_ref,
            stock_kind: sku.inventory.kind,
            entries: items,
        })
    }

    /// Release exactly one already-fulfilled item (partial, line-level
    /// cancellation).
    pub async fn item_cancel(
        &self,
        order: &Order,
        item: &OrderItem,
        item_ref: &DocRef,
        tx: &Transaction,
    ) -> Result<ReleasePlan> {
        let sku_ref = item.sku.clone().ok_or_else(|| {
            Error::InvalidArgument(format!(
                "order {}: item cancel requires a sku reference",
                order.id
            ))
        })?;
        let sku = self.load_sku(&order.id, &sku_ref, tx)?;

        // The shard holding this item, if the SKU is finite.
        let held: Vec<(DocRef, Stock)> = tx.query(
            &Query::new(paths::sku_stocks(&sku_ref))
                .filter("item", json!(item_ref))
                .limit(1),
        )?;

        Ok(ReleasePlan {
            delegate: self.delegate.clone(),
            kind: TradeKind::OrderChange,
            order: order.clone(),
            item: item.clone(),
            sku_ref,
            stock_kind: sku.inventory.kind,
            entries: vec![crate::delegate::FulfilledItem {
                item: item_ref.clone(),
                stock: held.into_iter().next().map(|(doc, _)| doc),
            }],
        })
    }

    fn load_sku(&self, order_id: &str, sku_ref: &DocRef, tx: &Transaction) -> Result<Sku> {
        tx.get(sku_ref)?.ok_or_else(|| {
            Error::InvalidArgument(format!("order {}: unknown sku {}", order_id, sku_ref))
        })
    }
}

/// Deferred commit of one `trade_item` call.
///
/// Holds the entities loaded during the read phase; `commit` issues every
/// write. A shard that lost its availability between selection and commit
/// fails the whole transaction with `InvalidShard`.
pub struct AllocationPlan {
    delegate: Arc<dyn TradeDelegate>,
    order: Order,
    item: OrderItem,
    sku_ref: DocRef,
    stock_kind: StockType,
    stock_value: Option<StockValue>,
    quantity: u32,
    stocks: Vec<(DocRef, Stock)>,
}

impl AllocationPlan {
    /// Issue all writes for this allocation: claim shards, create
    /// fulfillment items, and append one trade record per unit to the
    /// canonical log and both parties' logs.
    pub fn commit(&self, tx: &Transaction) -> Result<Vec<TradeTransaction>> {
        let mut records = Vec::with_capacity(self.quantity as usize);
        for i in 0..self.quantity as usize {
            let (item_ref, stock_ref) = match self.stock_kind {
                StockType::Finite => {
                    let (stock_ref, stock) = &self.stocks[i];
                    if !stock.is_available {
                        return Err(Error::InvalidShard(format!(
                            "order {}: shard {} is no longer available",
                            self.order.id, stock_ref
                        )));
                    }
                    let item_ref =
                        self.delegate
                            .create_item(&self.order, &self.item, Some(stock_ref), tx)?;
                    tx.merge(
                        stock_ref,
                        json!({
                            "is_available": false,
                            "item": item_ref,
                            "order": self.order.id,
                        }),
                    )?;
                    (item_ref, Some(stock_ref.clone()))
                }
                StockType::Infinite => {
                    let item_ref = self
                        .delegate
                        .create_item(&self.order, &self.item, None, tx)?;
                    (item_ref, None)
                }
                StockType::Bucket => {
                    let value = self.stock_value.ok_or_else(|| {
                        Error::InvalidArgument(format!(
                            "order {}: sku {} has no stock value",
                            self.order.id, self.sku_ref
                        ))
                    })?;
                    if value == StockValue::OutOfStock {
                        return Err(Error::InvalidShard(format!(
                            "order {}: sku {} stock value is out of stock",
                            self.order.id, self.sku_ref
                        )));
                    }
                    let item_ref = self
                        .delegate
                        .create_item(&self.order, &self.item, None, tx)?;
                    (item_ref, None)
                }
            };

            let record = TradeTransaction {
                id: Uuid::now_v7().to_string(),
                kind: TradeKind::Order,
                seller: self.item.seller.clone(),
                buyer: self.item.buyer.clone(),
                order: self.order.id.clone(),
                product: self.item.product.clone(),
                sku: self.sku_ref.clone(),
                stock: stock_ref,
                item: item_ref,
                created_at: Utc::now(),
            };
            append_trade_record(tx, &record)?;
            records.push(record);
        }

        tracing::info!(
            order = %self.order.id,
            sku = %self.sku_ref,
            units = records.len(),
            "allocation committed"
        );
        Ok(records)
    }
}

/// Deferred commit of a `cancel` or `item_cancel` call.
pub struct ReleasePlan {
    delegate: Arc<dyn TradeDelegate>,
    kind: TradeKind,
    order: Order,
    item: OrderItem,
    sku_ref: DocRef,
    stock_kind: StockType,
    entries: Vec<crate::delegate::FulfilledItem>,
}

impl ReleasePlan {
    /// Issue all writes for this release: cancel fulfillment items,
    /// restore shards for finite SKUs, and append one trade record per
    /// item to the canonical log and both parties' logs.
    pub fn commit(&self, tx: &Transaction) -> Result<Vec<TradeTransaction>> {
        let mut records = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            self.delegate
                .cancel_item(&self.order, &self.item, &entry.item, tx)?;

            if self.stock_kind == StockType::Finite {
                if let Some(stock_ref) = &entry.stock {
                    tx.merge(
                        stock_ref,
                        json!({
                            "is_available": true,
                            "item": null,
                            "order": null,
                        }),
                    )?;
                }
            }

            let record = TradeTransaction {
                id: Uuid::now_v7().to_string(),
                kind: self.kind,
                seller: self.order.seller.clone(),
                buyer: self.order.buyer.clone(),
                order: self.order.id.clone(),
                product: self.item.product.clone(),
                sku: self.sku_ref.clone(),
                stock: entry.stock.clone(),
                item: entry.item.clone(),
                created_at: Utc::now(),
            };
            append_trade_record(tx, &record)?;
            records.push(record);
        }

        tracing::info!(
            order = %self.order.id,
            sku = %self.sku_ref,
            kind = ?self.kind,
            items = records.len(),
            "release committed"
        );
        Ok(records)
    }
}

/// Fan out one trade record to its canonical copy and both parties'
/// logs; identical content and id across all three.
fn append_trade_record(tx: &Transaction, record: &TradeTransaction) -> Result<()> {
    tx.set(&paths::trade_transaction(&record.id), record)?;
    tx.set(
        &paths::user_trade_transaction(&record.seller, &record.id),
        record,
    )?;
    tx.set(
        &paths::user_trade_transaction(&record.buyer, &record.id),
        record,
    )?;
    Ok(())
}
