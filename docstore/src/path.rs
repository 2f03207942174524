//! Hierarchical document and collection paths
//!
//! Paths are slash-separated and alternate collection/document segments,
//! so a collection path has an odd number of segments and a document path
//! an even number:
//!
//! ```text
//! accounts                                   collection
//! accounts/alice                             document
//! accounts/alice/balance_transactions        subcollection
//! accounts/alice/balance_transactions/tx1    document
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a collection of documents
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionRef(String);

impl CollectionRef {
    /// Create a collection reference from a path with an odd number of
    /// non-empty segments.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        debug_assert!(segments_valid(&path) && depth(&path) % 2 == 1);
        Self(path)
    }

    /// Reference a document inside this collection
    pub fn doc(&self, id: impl AsRef<str>) -> DocRef {
        let id = id.as_ref();
        debug_assert!(!id.is_empty() && !id.contains('/'));
        DocRef(format!("{}/{}", self.0, id))
    }

    /// Full path as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reference to a single document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocRef(String);

impl DocRef {
    /// Create a document reference from a path with an even number of
    /// non-empty segments.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        debug_assert!(segments_valid(&path) && depth(&path) % 2 == 0);
        Self(path)
    }

    /// Reference a subcollection of this document
    pub fn collection(&self, name: impl AsRef<str>) -> CollectionRef {
        let name = name.as_ref();
        debug_assert!(!name.is_empty() && !name.contains('/'));
        CollectionRef(format!("{}/{}", self.0, name))
    }

    /// Last path segment (the document id)
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The collection this document belongs to
    pub fn parent(&self) -> CollectionRef {
        match self.0.rsplit_once('/') {
            Some((parent, _)) => CollectionRef(parent.to_string()),
            None => CollectionRef(self.0.clone()),
        }
    }

    /// Full path as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn depth(path: &str) -> usize {
    path.split('/').count()
}

fn segments_valid(path: &str) -> bool {
    !path.is_empty() && path.split('/').all(|s| !s.is_empty())
}
