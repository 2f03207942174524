//! Collection layout
//!
//! ```text
//! skus/{sku}                                     canonical SKU
//! skus/{sku}/stocks/{shard}                      shard collection (finite)
//! orders/{order}                                 canonical order
//! trade_transactions/{id}                        canonical trade log
//! users/{user}/trade_transactions/{id}           per-party trade log
//! users/{user}/orders/{order}                    buyer's order copy
//! users/{user}/received_orders/{order}           seller's order copy
//! accounts/{account}                             ledger account
//! balance_transactions/{id}                      canonical balance log
//! accounts/{account}/balance_transactions/{id}   per-account balance log
//! accounts/{account}/payout_requests/{id}        payout sub-log
//! ```

use docstore::{CollectionRef, DocRef};

/// Canonical SKU document
pub fn sku(id: &str) -> DocRef {
    CollectionRef::new("skus").doc(id)
}

/// Shard collection of a finite SKU
pub fn sku_stocks(sku: &DocRef) -> CollectionRef {
    sku.collection("stocks")
}

/// Canonical order document
pub fn order(id: &str) -> DocRef {
    CollectionRef::new("orders").doc(id)
}

/// Canonical trade transaction copy
pub fn trade_transaction(id: &str) -> DocRef {
    CollectionRef::new("trade_transactions").doc(id)
}

/// A party's own trade transaction copy
pub fn user_trade_transaction(user: &str, id: &str) -> DocRef {
    CollectionRef::new("users")
        .doc(user)
        .collection("trade_transactions")
        .doc(id)
}

/// Buyer's copy of an order
pub fn user_order(user: &str, id: &str) -> DocRef {
    CollectionRef::new("users").doc(user).collection("orders").doc(id)
}

/// Seller's copy of an order
pub fn user_received_order(user: &str, id: &str) -> DocRef {
    CollectionRef::new("users")
        .doc(user)
        .collection("received_orders")
        .doc(id)
}

/// Ledger account document
pub fn account(id: &str) -> DocRef {
    CollectionRef::new("accounts").doc(id)
}

/// Canonical balance transaction copy
pub fn balance_transaction(id: &str) -> DocRef {
    CollectionRef::new("balance_transactions").doc(id)
}

/// An account's own balance transaction copy
pub fn account_balance_transaction(account: &str, id: &str) -> DocRef {
    CollectionRef::new("accounts")
        .doc(account)
        .collection("balance_transactions")
        .doc(id)
}

/// An account's payout request copy
pub fn account_payout_request(account: &str, id: &str) -> DocRef {
    CollectionRef::new("accounts")
        .doc(account)
        .collection("payout_requests")
        .doc(id)
}
