//! Payout request fan-out and status machine

use crate::{
    error::{Error, Result},
    paths,
    types::{Payout, PayoutStatus, TransactionResult},
};
use docstore::Transaction;
use serde_json::Value;

/// Payout request helper
#[derive(Debug, Clone, Copy, Default)]
pub struct PayoutManager;

impl PayoutManager {
    /// Create a payout manager
    pub fn new() -> Self {
        Self
    }

    /// Write the payout's current state to its account's request log,
    /// appending a gateway result when one is present.
    pub fn update(&self, payout: &Payout, result: TransactionResult, tx: &Transaction) -> Result<()> {
        let mut data = serde_json::to_value(payout).map_err(docstore::Error::from)?;
        if !result.is_null() {
            if let Some(Value::Array(results)) = data.get_mut("transaction_results") {
                results.push(result);
            }
        }
        tx.set(
            &paths::account_payout_request(&payout.account, &payout.id),
            &data,
        )?;
        Ok(())
    }

    /// Move a payout through its status machine and persist the change.
    ///
    /// Fails with `InvalidStatus` on a move the machine forbids.
    pub fn transition(
        &self,
        payout: &mut Payout,
        next: PayoutStatus,
        result: TransactionResult,
        tx: &Transaction,
    ) -> Result<()> {
        if !payout.status.can_transition(next) {
            return Err(Error::InvalidStatus(format!(
                "payout {}: cannot move from {:?} to {:?}",
                payout.id, payout.status, next
            )));
        }
        payout.status = next;
        if next == PayoutStatus::Cancelled {
            payout.is_cancelled = true;
        }
        if !result.is_null() {
            payout.transaction_results.push(result);
        }
        self.update(payout, Value::Null, tx)
    }
}
