//! Order fan-out helper
//!
//! Orders are denormalized three ways: the canonical document, the
//! buyer's copy, and the seller's received copy. Field patches must land
//! on all three inside one transaction.

use crate::{
    error::{Error, Result},
    paths,
    types::{Order, TransactionResult},
};
use docstore::Transaction;
use serde_json::Value;

/// Order fan-out helper
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderManager;

impl OrderManager {
    /// Create an order manager
    pub fn new() -> Self {
        Self
    }

    /// Patch an order's fields on every copy, appending a gateway result
    /// when one is present.
    pub fn update(
        &self,
        order: &Order,
        patch: Value,
        result: TransactionResult,
        tx: &Transaction,
    ) -> Result<()> {
        let Value::Object(patch) = patch else {
            return Err(Error::InvalidArgument(format!(
                "order {}: update patch must be an object",
                order.id
            )));
        };

        let mut data = serde_json::to_value(order).map_err(docstore::Error::from)?;
        if let Some(map) = data.as_object_mut() {
            for (key, value) in patch {
                map.insert(key, value);
            }
            if !result.is_null() {
                if let Some(Value::Array(results)) = map.get_mut("transaction_results") {
                    results.push(result);
                }
            }
        }

        tx.set(&paths::order(&order.id), &data)?;
        tx.set(&paths::user_received_order(&order.seller, &order.id), &data)?;
        tx.set(&paths::user_order(&order.buyer, &order.id), &data)?;
        Ok(())
    }
}
