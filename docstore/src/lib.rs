//! In-memory document store with optimistic multi-document transactions.
//!
//! The store models the substrate a marketplace engine runs on: a
//! hierarchy of collections and documents (JSON values), written through
//! atomic all-or-nothing transactions with optimistic conflict detection
//! and automatic retry.
//!
//! # Transaction contract
//!
//! - All reads of a transaction must complete before its first write;
//!   a read issued after a staged write fails with [`Error::ReadAfterWrite`].
//! - Every document a transaction reads (directly or through a query) is
//!   version-checked at commit. A concurrent commit that touched any of
//!   them aborts this transaction with [`Error::Conflict`], and
//!   [`DocStore::run`] retries it.
//! - Writes are staged in memory and become visible only when the whole
//!   transaction commits. An error returned from the transaction closure
//!   discards every staged write and propagates unchanged.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

pub mod error;
pub mod path;
pub mod store;
pub mod transaction;

// Re-exports
pub use error::{Error, Result};
pub use path::{CollectionRef, DocRef};
pub use store::{DocStore, RetryPolicy};
pub use transaction::{Query, Transaction};
