//! The committed document map and the optimistic retry loop

use crate::{
    error::{Error, Result},
    path::DocRef,
    transaction::Transaction,
};
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// One committed document with its write version.
///
/// Versions start at 1 on first write; an absent document reads as
/// version 0, so a transaction that observed "absent" conflicts with a
/// concurrent creation.
#[derive(Debug, Clone)]
pub(crate) struct VersionedDoc {
    pub(crate) version: u64,
    pub(crate) data: Value,
}

/// Retry behaviour of [`DocStore::run`]
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum commit attempts before giving up
    pub max_attempts: u32,

    /// Pause between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_millis(10),
        }
    }
}

/// In-memory versioned document store
#[derive(Debug, Default, Clone)]
pub struct DocStore {
    pub(crate) docs: Arc<RwLock<BTreeMap<String, VersionedDoc>>>,
}

impl DocStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a closure inside an optimistic transaction.
    ///
    /// The closure may be invoked several times: a commit-time version
    /// conflict discards the staged writes and retries with a fresh
    /// transaction, up to `policy.max_attempts`. An error returned by the
    /// closure aborts immediately and propagates unchanged.
    pub async fn run<T, E, F, Fut>(&self, policy: RetryPolicy, f: F) -> std::result::Result<T, E>
    where
        F: Fn(Transaction) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<Error>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let tx = Transaction::begin(self.docs.clone());
            match f(tx.clone()).await {
                Ok(value) => match tx.commit() {
                    Ok(()) => return Ok(value),
                    Err(err @ Error::Conflict { .. }) if attempt < policy.max_attempts => {
                        tracing::debug!(attempt, %err, "transaction conflict, retrying");
                        tokio::time::sleep(policy.backoff).await;
                    }
                    Err(Error::Conflict { .. }) => {
                        return Err(Error::AttemptsExhausted { attempts: attempt }.into());
                    }
                    Err(err) => return Err(err.into()),
                },
                // Closure errors abort the transaction; staged writes are
                // dropped with it.
                Err(err) => return Err(err),
            }
        }
    }

    /// Write one document outside any transaction (seeding, tooling).
    pub fn put<T: Serialize>(&self, doc: &DocRef, value: &T) -> Result<()> {
        let data = serde_json::to_value(value)?;
        let mut docs = self.docs.write();
        let entry = docs.entry(doc.as_str().to_string()).or_insert(VersionedDoc {
            version: 0,
            data: Value::Null,
        });
        entry.data = data;
        entry.version += 1;
        Ok(())
    }

    /// Read the committed state of one document outside any transaction.
    pub fn get<T: DeserializeOwned>(&self, doc: &DocRef) -> Result<Option<T>> {
        let docs = self.docs.read();
        match docs.get(doc.as_str()) {
            Some(entry) => Ok(Some(serde_json::from_value(entry.data.clone())?)),
            None => Ok(None),
        }
    }
}
