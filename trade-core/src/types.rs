//! Core record types
//!
//! All persisted records serialize through serde into the document store.
//! Monetary amounts are integers in the currency's minor unit; no rounding
//! logic lives here.

use chrono::{DateTime, Utc};
use docstore::DocRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque gateway response stored verbatim on ledger records
pub type TransactionResult = serde_json::Value;

/// ISO 4217 currency code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Currency {
    /// Japanese Yen
    JPY,
    /// US Dollar
    USD,
    /// Euro
    EUR,
    /// British Pound
    GBP,
}

impl Currency {
    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::JPY => "JPY",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Inventory policy of a SKU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockType {
    /// Counted stock backed by one shard document per unit
    Finite,
    /// Unlimited stock, no shard bookkeeping
    Infinite,
    /// Coarse availability value instead of a count
    Bucket,
}

/// Coarse availability for bucket inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockValue {
    /// Plenty available
    InStock,
    /// Running low
    Limited,
    /// Exhausted
    OutOfStock,
}

/// Inventory descriptor; `kind` is immutable after SKU creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Inventory policy
    #[serde(rename = "type")]
    pub kind: StockType,

    /// Unit count, finite inventory only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,

    /// Availability value, bucket inventory only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<StockValue>,
}

fn default_number_of_fetch() -> u32 {
    2
}

/// Sellable catalog entry
///
/// Only finite SKUs own a `stocks` shard subcollection (see
/// [`crate::paths::sku_stocks`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sku {
    /// Selling account id
    pub seller: String,

    /// Creating account id
    pub created_by: String,

    /// Product this SKU belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<DocRef>,

    /// Unit price currency
    pub currency: Currency,

    /// Unit price in minor units
    pub amount: i64,

    /// Inventory policy
    pub inventory: Inventory,

    /// Whether the SKU can currently be traded at all
    pub is_available: bool,

    /// Oversampling factor: shard candidates fetched per requested unit.
    /// Tunable per SKU to trade retry storms against query width.
    #[serde(default = "default_number_of_fetch")]
    pub number_of_fetch: u32,
}

/// One allocatable unit of a finite SKU.
///
/// Invariant: an unavailable shard always carries both back-references,
/// an available shard carries neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stock {
    /// Whether this shard can be claimed
    pub is_available: bool,

    /// Order currently holding the shard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,

    /// Fulfilled item currently holding the shard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<DocRef>,
}

impl Stock {
    /// A fresh, claimable shard
    pub fn available() -> Self {
        Self {
            is_available: true,
            order: None,
            item: None,
        }
    }
}

/// Kind of an order line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderItemKind {
    /// References a SKU; the only kind the allocator touches
    Sku,
    /// Tax line
    Tax,
    /// Shipping line
    Shipping,
    /// Discount line
    Discount,
}

/// Lifecycle of an order line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderItemStatus {
    /// Not yet traded
    None,
    /// Traded
    Ordered,
    /// Partially cancelled
    Changed,
    /// Fully cancelled
    Cancelled,
}

/// One line of a purchase request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Buying account id
    pub buyer: String,

    /// Selling account id
    pub seller: String,

    /// Line kind
    #[serde(rename = "type")]
    pub kind: OrderItemKind,

    /// Product reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<DocRef>,

    /// SKU reference, required for `sku` lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<DocRef>,

    /// Requested unit count
    pub quantity: u32,

    /// Line currency
    pub currency: Currency,

    /// Line amount in minor units
    pub amount: i64,

    /// Line status
    pub status: OrderItemStatus,
}

/// Payment progress of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderPaymentStatus {
    /// No payment activity yet
    None,
    /// Funds held by the gateway
    Authorized,
    /// Captured
    Paid,
    /// Cancelled before capture
    Cancelled,
    /// Rejected by the gateway
    Rejected,
}

/// A purchase request
///
/// Created externally; mutated only by the allocator/ledger during
/// checkout, cancellation, or item-level change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Document id
    pub id: String,

    /// Buying account id
    pub buyer: String,

    /// Selling account id
    pub seller: String,

    /// Order currency
    pub currency: Currency,

    /// Total amount in minor units
    pub amount: i64,

    /// Order lines
    pub items: Vec<OrderItem>,

    /// Payment progress
    pub payment_status: OrderPaymentStatus,

    /// Gateway responses accumulated across the order's lifecycle
    #[serde(default)]
    pub transaction_results: Vec<TransactionResult>,

    /// Whether the whole order was cancelled
    #[serde(default)]
    pub is_cancelled: bool,
}

/// Kind of a trade transaction record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeKind {
    /// Allocation of one unit
    Order,
    /// Partial, item-level cancellation
    OrderChange,
    /// Full cancellation of an order line
    OrderCancel,
}

/// Immutable record of one allocation event.
///
/// Written once per shard per event, never updated, and denormalized
/// into the canonical log plus both parties' own logs with identical
/// content and id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeTransaction {
    /// Record id, identical across all copies
    pub id: String,

    /// Event kind
    #[serde(rename = "type")]
    pub kind: TradeKind,

    /// Selling account id
    pub seller: String,

    /// Buying account id
    pub buyer: String,

    /// Order id
    pub order: String,

    /// Product reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<DocRef>,

    /// SKU reference
    pub sku: DocRef,

    /// Shard reference, finite inventory only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<DocRef>,

    /// Fulfilled item reference
    pub item: DocRef,

    /// Record creation time
    pub created_at: DateTime<Utc>,
}

/// A ledger party: a real account or one of the two reserved
/// pseudo-accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Party {
    /// The marketplace operator's pseudo-account
    Platform,
    /// The external bank pseudo-account payouts settle against
    Bank,
    /// A platform-known account
    Account(String),
}

impl Party {
    /// Reserved id of the platform pseudo-account
    pub const PLATFORM: &'static str = "platform";

    /// Reserved id of the bank pseudo-account
    pub const BANK: &'static str = "bank_account";

    /// The real account id, if this party is not a pseudo-account
    pub fn account_id(&self) -> Option<&str> {
        match self {
            Party::Account(id) => Some(id),
            _ => None,
        }
    }
}

impl From<String> for Party {
    fn from(id: String) -> Self {
        match id.as_str() {
            Party::PLATFORM => Party::Platform,
            Party::BANK => Party::Bank,
            _ => Party::Account(id),
        }
    }
}

impl From<Party> for String {
    fn from(party: Party) -> Self {
        match party {
            Party::Platform => Party::PLATFORM.to_string(),
            Party::Bank => Party::BANK.to_string(),
            Party::Account(id) => id,
        }
    }
}

impl From<&str> for Party {
    fn from(id: &str) -> Self {
        Party::from(id.to_string())
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::Platform => write!(f, "{}", Party::PLATFORM),
            Party::Bank => write!(f, "{}", Party::BANK),
            Party::Account(id) => write!(f, "{}", id),
        }
    }
}

/// Running balances of one account, keyed by currency
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Balance {
    /// Withdrawable funds
    #[serde(default)]
    pub available: BTreeMap<Currency, i64>,

    /// Funds awaiting settlement
    #[serde(default)]
    pub pending: BTreeMap<Currency, i64>,
}

impl Balance {
    /// Available amount for one currency (0 if never touched)
    pub fn available_for(&self, currency: Currency) -> i64 {
        self.available.get(&currency).copied().unwrap_or(0)
    }
}

/// Ledger subject, one per platform-known party.
///
/// Invariant: `balance.available[ccy]` is the signed sum of all balance
/// transactions affecting this account for that currency.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Account {
    /// Country of residence
    #[serde(default)]
    pub country: String,

    /// Whether onboarding was rejected
    #[serde(default)]
    pub is_rejected: bool,

    /// Whether the account holder signed up
    #[serde(default)]
    pub is_signed: bool,

    /// Running balances
    #[serde(default)]
    pub balance: Balance,
}

/// Kind of a balance transaction record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceKind {
    /// Buyer pays the platform
    Payment,
    /// Platform pays the buyer back
    PaymentRefund,
    /// Funds move between accounts (or one side is the platform)
    Transfer,
    /// Reversal of a transfer
    TransferRefund,
    /// Withdrawal to the bank
    Payout,
    /// Withdrawal cancelled
    PayoutCancel,
}

/// Immutable record of one monetary movement.
///
/// Denormalized into the canonical log and into every participating real
/// account's own log, identical content and id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceTransaction {
    /// Record id, identical across all copies
    pub id: String,

    /// Movement kind
    #[serde(rename = "type")]
    pub kind: BalanceKind,

    /// Currency
    pub currency: Currency,

    /// Amount in minor units, always non-negative; direction is carried
    /// by `from`/`to`
    pub amount: i64,

    /// Paying party
    pub from: Party,

    /// Receiving party
    pub to: Party,

    /// Originating order id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,

    /// Originating transfer reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer: Option<DocRef>,

    /// Originating payout reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout: Option<DocRef>,

    /// Opaque gateway responses, stored verbatim
    #[serde(default)]
    pub transaction_results: Vec<TransactionResult>,

    /// Record creation time
    pub created_at: DateTime<Utc>,
}

/// Withdrawal request status machine:
/// `none -> requested -> completed | rejected | cancelled`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    /// Created, not yet requested
    None,
    /// Submitted to the gateway
    Requested,
    /// Rejected by the gateway
    Rejected,
    /// Funds arrived at the bank
    Completed,
    /// Withdrawn by the account holder
    Cancelled,
}

impl PayoutStatus {
    /// Whether the status machine allows moving to `next`
    pub fn can_transition(self, next: PayoutStatus) -> bool {
        matches!(
            (self, next),
            (PayoutStatus::None, PayoutStatus::Requested)
                | (PayoutStatus::Requested, PayoutStatus::Completed)
                | (PayoutStatus::Requested, PayoutStatus::Rejected)
                | (PayoutStatus::Requested, PayoutStatus::Cancelled)
        )
    }
}

/// A withdrawal request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payout {
    /// Document id
    pub id: String,

    /// Requesting account id
    pub account: String,

    /// Currency
    pub currency: Currency,

    /// Amount in minor units
    pub amount: i64,

    /// Current status
    pub status: PayoutStatus,

    /// Opaque gateway responses
    #[serde(default)]
    pub transaction_results: Vec<TransactionResult>,

    /// Whether the request was cancelled
    #[serde(default)]
    pub is_cancelled: bool,

    /// Record creation time
    pub created_at: DateTime<Utc>,
}
