//! Tradestore — marketplace transaction engine
//!
//! Reconciles inventory allocation, trade history, and monetary balance
//! movements for a multi-party order (buyer, seller, platform) inside a
//! single atomic transaction over [`docstore`].
//!
//! # Architecture
//!
//! - **Stock allocation**: sharded finite inventory reserved through
//!   oversampled random picks, committed via explicit two-phase plans
//! - **Balance ledger**: append-only monetary records fanned out to every
//!   participant's log, with running available balances
//! - **Coordinator**: one transaction per logical operation, delegate
//!   injection for payment and fulfillment collaborators
//!
//! # Invariants
//!
//! - No shard is ever allocated twice; an unavailable shard always carries
//!   its order and item back-references
//! - Available balance equals the signed sum of an account's balance
//!   transactions per currency
//! - Every denormalized copy of a record is written in the same
//!   transaction, or none are

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod balance;
pub mod config;
pub mod delegate;
pub mod error;
pub mod manager;
pub mod order;
pub mod paths;
pub mod payout;
pub mod stock;
pub mod types;

// Re-exports
pub use balance::BalanceManager;
pub use config::Config;
pub use delegate::{FulfilledItem, PaymentDelegate, TradeDelegate};
pub use error::{Error, Result};
pub use manager::Manager;
pub use order::OrderManager;
pub use payout::PayoutManager;
pub use stock::{AllocationPlan, ReleasePlan, StockManager};
pub use types::{
    Account, Balance, BalanceKind, BalanceTransaction, Currency, Inventory, Order, OrderItem,
    OrderItemKind, Party, Payout, PayoutStatus, Sku, Stock, StockType, StockValue, TradeKind,
    TradeTransaction, TransactionResult,
};
