//! Transaction handle: versioned reads, queries, and staged writes

use crate::{
    error::{Error, Result},
    path::{CollectionRef, DocRef},
    store::VersionedDoc,
};
use parking_lot::{Mutex, RwLock};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A collection scan with field-equality filters and a limit.
///
/// Only direct children of the collection are matched. Results come back
/// in document-id order, so a query is deterministic for a given
/// committed state.
#[derive(Debug, Clone)]
pub struct Query {
    collection: CollectionRef,
    filters: Vec<(String, Value)>,
    limit: Option<usize>,
}

impl Query {
    /// Scan all documents of a collection
    pub fn new(collection: CollectionRef) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            limit: None,
        }
    }

    /// Keep only documents whose top-level `field` equals `value`
    pub fn filter(mut self, field: impl Into<String>, value: Value) -> Self {
        self.filters.push((field.into(), value));
        self
    }

    /// Return at most `n` documents
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}

enum WriteOp {
    Set(Value),
    Merge(Value),
}

struct Write {
    doc: DocRef,
    op: WriteOp,
}

#[derive(Default)]
struct TxState {
    /// path -> version observed at first read (0 = absent)
    reads: HashMap<String, u64>,
    writes: Vec<Write>,
}

/// Handle to one in-flight transaction.
///
/// Cheap to clone; all clones share the same read and write sets.
#[derive(Clone)]
pub struct Transaction {
    docs: Arc<RwLock<BTreeMap<String, VersionedDoc>>>,
    state: Arc<Mutex<TxState>>,
}

impl Transaction {
    pub(crate) fn begin(docs: Arc<RwLock<BTreeMap<String, VersionedDoc>>>) -> Self {
        Self {
            docs,
            state: Arc::new(Mutex::new(TxState::default())),
        }
    }

    /// Read one document, joining it to the transaction's read set.
    ///
    /// Fails with [`Error::ReadAfterWrite`] once any write has been
    /// staged: the store's contract requires every read of a transaction
    /// to precede its first write.
    pub fn get<T: DeserializeOwned>(&self, doc: &DocRef) -> Result<Option<T>> {
        let mut state = self.state.lock();
        if !state.writes.is_empty() {
            return Err(Error::ReadAfterWrite {
                path: doc.as_str().to_string(),
            });
        }
        let docs = self.docs.read();
        let entry = docs.get(doc.as_str());
        let version = entry.map(|d| d.version).unwrap_or(0);
        state
            .reads
            .entry(doc.as_str().to_string())
            .or_insert(version);
        match entry {
            Some(entry) => Ok(Some(serde_json::from_value(entry.data.clone())?)),
            None => Ok(None),
        }
    }

    /// Run a collection query; every returned document joins the read set.
    pub fn query<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<(DocRef, T)>> {
        let mut state = self.state.lock();
        if !state.writes.is_empty() {
            return Err(Error::ReadAfterWrite {
                path: query.collection.as_str().to_string(),
            });
        }

        let prefix = format!("{}/", query.collection.as_str());
        let docs = self.docs.read();
        let mut results = Vec::new();
        for (path, entry) in docs.range(prefix.clone()..) {
            if !path.starts_with(&prefix) {
                break;
            }
            // Direct children only; subcollection documents have deeper paths.
            if path[prefix.len()..].contains('/') {
                continue;
            }
            let matches = query.filters.iter().all(|(field, value)| {
                entry.data.get(field).map(|v| v == value).unwrap_or(false)
            });
            if !matches {
                continue;
            }
            state.reads.entry(path.clone()).or_insert(entry.version);
            results.push((DocRef::new(path.clone()), serde_json::from_value(entry.data.clone())?));
            if query.limit.is_some_and(|limit| results.len() >= limit) {
                break;
            }
        }
        Ok(results)
    }

    /// Stage a full overwrite of one document
    pub fn set<T: Serialize>(&self, doc: &DocRef, value: &T) -> Result<()> {
        let data = serde_json::to_value(value)?;
        self.state.lock().writes.push(Write {
            doc: doc.clone(),
            op: WriteOp::Set(data),
        });
        Ok(())
    }

    /// Stage a merge-patch of one document.
    ///
    /// Objects merge recursively; a `null` value deletes the field; any
    /// other value replaces it. Patching an absent document creates it.
    pub fn merge(&self, doc: &DocRef, patch: Value) -> Result<()> {
        self.state.lock().writes.push(Write {
            doc: doc.clone(),
            op: WriteOp::Merge(patch),
        });
        Ok(())
    }

    /// Validate the read set and apply staged writes atomically.
    pub(crate) fn commit(&self) -> Result<()> {
        let state = self.state.lock();
        let mut docs = self.docs.write();

        for (path, version) in &state.reads {
            let current = docs.get(path).map(|d| d.version).unwrap_or(0);
            if current != *version {
                return Err(Error::Conflict { path: path.clone() });
            }
        }

        for write in &state.writes {
            let entry = docs
                .entry(write.doc.as_str().to_string())
                .or_insert(VersionedDoc {
                    version: 0,
                    data: Value::Null,
                });
            match &write.op {
                WriteOp::Set(value) => entry.data = value.clone(),
                WriteOp::Merge(patch) => merge_patch(&mut entry.data, patch),
            }
            entry.version += 1;
        }

        tracing::trace!(
            reads = state.reads.len(),
            writes = state.writes.len(),
            "transaction committed"
        );
        Ok(())
    }
}

/// JSON merge-patch: objects merge key-wise, `null` deletes, everything
/// else replaces.
fn merge_patch(target: &mut Value, patch: &Value) {
    match patch {
        Value::Object(entries) => {
            if !target.is_object() {
                *target = Value::Object(serde_json::Map::new());
            }
            if let Some(map) = target.as_object_mut() {
                for (key, value) in entries {
                    if value.is_null() {
                        map.remove(key);
                    } else {
                        merge_patch(map.entry(key.clone()).or_insert(Value::Null), value);
                    }
                }
            }
        }
        _ => *target = patch.clone(),
    }
}
