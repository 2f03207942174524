//! Error types for the document store

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Store errors
#[derive(Error, Debug)]
pub enum Error {
    /// A document read by this transaction was modified by a concurrent
    /// commit before this transaction committed.
    #[error("write conflict on {path}")]
    Conflict {
        /// Path of the contended document
        path: String,
    },

    /// A read was issued after the transaction staged its first write.
    #[error("read of {path} issued after a write was staged")]
    ReadAfterWrite {
        /// Path of the offending read
        path: String,
    },

    /// Retry budget exhausted without a successful commit.
    #[error("transaction aborted after {attempts} attempts")]
    AttemptsExhausted {
        /// Number of attempts made
        attempts: u32,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
