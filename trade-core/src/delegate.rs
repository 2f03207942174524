//! Delegate contracts consumed, never implemented, by the engine
//!
//! Both delegates run synchronously inside the engine's transaction;
//! their side effects must themselves go through the transaction handle
//! so they commit or abort together with the engine's writes.

use crate::{
    error::Result,
    types::{Currency, Order, OrderItem, TransactionResult},
};
use docstore::{DocRef, Transaction};

/// One fulfillment record previously created by the trade delegate
#[derive(Debug, Clone)]
pub struct FulfilledItem {
    /// The item document
    pub item: DocRef,

    /// The shard the item holds, finite inventory only
    pub stock: Option<DocRef>,
}

/// Fulfillment collaborator of the allocator
pub trait TradeDelegate: Send + Sync {
    /// Soft pre-check hook; no inventory is consumed
    fn reserve(&self, order: &Order, item: &OrderItem, tx: &Transaction) -> Result<()>;

    /// Create one fulfillment record for one allocated unit and return
    /// its reference. `stock` is the committed shard, absent for
    /// infinite/bucket inventory.
    fn create_item(
        &self,
        order: &Order,
        item: &OrderItem,
        stock: Option<&DocRef>,
        tx: &Transaction,
    ) -> Result<DocRef>;

    /// All fulfillment records previously created for this order line
    fn get_items(&self, order: &Order, item: &OrderItem, tx: &Transaction)
        -> Result<Vec<FulfilledItem>>;

    /// Cancel one previously created fulfillment record
    fn cancel_item(
        &self,
        order: &Order,
        item: &OrderItem,
        item_ref: &DocRef,
        tx: &Transaction,
    ) -> Result<()>;
}

/// Options forwarded to payment-gateway calls
#[derive(Debug, Clone, Default)]
pub struct PaymentOptions {
    /// Payment source token
    pub source: Option<String>,

    /// Gateway customer id
    pub customer: Option<String>,

    /// Gateway vendor identifier
    pub vendor_type: String,

    /// Fee rate withheld on refunds, 0.0 to 1.0
    pub refund_fee_rate: f64,
}

/// Options forwarded to transfer calls
#[derive(Debug, Clone, Default)]
pub struct TransferOptions {
    /// Gateway vendor identifier
    pub vendor_type: String,

    /// Share of the order amount transferred to the seller, 0.0 to 1.0
    pub transfer_rate: f64,
}

/// Options forwarded to payout calls
#[derive(Debug, Clone, Default)]
pub struct PayoutOptions {
    /// Gateway vendor identifier
    pub vendor_type: String,
}

/// Payment gateway collaborator.
///
/// Every call returns an opaque gateway result that the balance ledger
/// stores verbatim; the engine never inspects gateway-specific fields.
pub trait PaymentDelegate: Send + Sync {
    /// Hold funds without capturing them
    fn authorize(
        &self,
        currency: Currency,
        amount: i64,
        order: &Order,
        options: &PaymentOptions,
    ) -> Result<TransactionResult>;

    /// Release a previous hold
    fn authorize_cancel(
        &self,
        currency: Currency,
        amount: i64,
        order: &Order,
        options: &PaymentOptions,
    ) -> Result<TransactionResult>;

    /// Capture funds from the buyer
    fn charge(
        &self,
        currency: Currency,
        amount: i64,
        order: &Order,
        options: &PaymentOptions,
    ) -> Result<TransactionResult>;

    /// Return a full capture
    fn refund(
        &self,
        currency: Currency,
        amount: i64,
        order: &Order,
        options: &PaymentOptions,
        reason: Option<&str>,
    ) -> Result<TransactionResult>;

    /// Return part of a capture for a single order line
    fn part_refund(
        &self,
        currency: Currency,
        amount: i64,
        order: &Order,
        item: &OrderItem,
        options: &PaymentOptions,
        reason: Option<&str>,
    ) -> Result<TransactionResult>;

    /// Move captured funds to a seller's gateway account
    fn transfer(
        &self,
        currency: Currency,
        amount: i64,
        order: &Order,
        to_account: &str,
        options: &TransferOptions,
    ) -> Result<TransactionResult>;

    /// Reverse a transfer
    fn transfer_cancel(
        &self,
        currency: Currency,
        amount: i64,
        order: &Order,
        options: &TransferOptions,
        reason: Option<&str>,
    ) -> Result<TransactionResult>;

    /// Pay an account's balance out to its bank
    fn payout(
        &self,
        currency: Currency,
        amount: i64,
        account: &str,
        options: &PayoutOptions,
    ) -> Result<TransactionResult>;

    /// Cancel a requested payout
    fn payout_cancel(
        &self,
        currency: Currency,
        amount: i64,
        account: &str,
        options: &PayoutOptions,
    ) -> Result<TransactionResult>;

    /// Start a recurring subscription for an account
    fn subscribe(&self, account: &str, options: &PaymentOptions) -> Result<TransactionResult>;
}
