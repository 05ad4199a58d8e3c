//! Record stores - The narrow client surface the bulk engine consumes.
//!
//! A store offers point reads, partition-scoped paged queries, and
//! conditional writes guarded by a [`VersionToken`]. Conditional writes that
//! lose the race fail with [`StoreError::VersionMismatch`], which is the only
//! error the engine treats as retryable.
//!
//! ## Example
//!
//! ```ignore
//! use bulk_graph::{InMemoryRecordStore, QueryFilter, RecordStore, Vertex};
//!
//! let store = InMemoryRecordStore::new();
//! let saved = store.upsert(&vertex).await?;
//! let page = store
//!     .query_page::<Vertex>("fleet1", &QueryFilter::all(), None, 100)
//!     .await?;
//! store.replace_if_match(&updated, &saved.version).await?;
//! ```

mod in_memory;
mod store;

use std::fmt;
use std::sync::Arc;

use crate::document::{VersionToken, Versioned};

/// Error type for record store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The supplied version token no longer matches the stored one.
    #[error("version mismatch on {collection}:{id} (expected {expected}, actual {actual})")]
    VersionMismatch {
        collection: String,
        id: String,
        expected: VersionToken,
        actual: VersionToken,
    },
    /// Document not found.
    #[error("document not found: {collection}:{id}")]
    NotFound { collection: String, id: String },
    /// Insert of a document that already exists.
    #[error("document already exists: {collection}:{id}")]
    AlreadyExists { collection: String, id: String },
    /// Timeout, throttling, or a dropped connection. Retryable by the caller.
    #[error("transient store error: {0}")]
    Transient(String),
    /// Serialization/deserialization error.
    #[error("document serialization error: {0}")]
    Serde(String),
    /// Storage-level error.
    #[error("document storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn is_version_mismatch(&self) -> bool {
        matches!(self, StoreError::VersionMismatch { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err.to_string())
    }
}

/// One page of query results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<Versioned<T>>,
    /// Opaque cursor for the next page; `None` once the query is drained.
    pub continuation: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<Versioned<T>>) -> Self {
        Page {
            items,
            continuation: None,
        }
    }

    pub fn has_more(&self) -> bool {
        self.continuation.is_some()
    }
}

/// Predicate applied to documents inside the queried partition.
pub struct QueryFilter<T> {
    predicate: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> QueryFilter<T> {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        QueryFilter {
            predicate: Arc::new(predicate),
        }
    }

    /// Matches every document in the partition.
    pub fn all() -> Self {
        QueryFilter {
            predicate: Arc::new(|_| true),
        }
    }

    pub fn matches(&self, document: &T) -> bool {
        (self.predicate)(document)
    }
}

impl<T> Clone for QueryFilter<T> {
    fn clone(&self) -> Self {
        QueryFilter {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<T> Default for QueryFilter<T> {
    fn default() -> Self {
        Self::all()
    }
}

impl<T> fmt::Debug for QueryFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryFilter").finish_non_exhaustive()
    }
}

pub use in_memory::InMemoryRecordStore;
pub use store::RecordStore;
