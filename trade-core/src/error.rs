//! Error types for the engine

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Engine errors
///
/// Every validation failure is raised before or during a plan commit and
/// aborts the enclosing transaction; the substrate discards all staged
/// writes and the caller sees the error unchanged.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed SKU, order, or delegate
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Insufficient available shards, or bucket inventory exhausted
    #[error("out of stock: {0}")]
    OutOfStock(String),

    /// A previously selected shard turned out unavailable at commit time
    #[error("invalid shard: {0}")]
    InvalidShard(String),

    /// Order or payout in a state that forbids the requested operation
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// Substrate failure (conflict retries exhausted, serialization, ...)
    #[error("storage error: {0}")]
    Store(#[from] docstore::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected failure
    #[error("internal error: {0}")]
    Internal(String),
}
