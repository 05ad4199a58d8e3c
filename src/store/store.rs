//! RecordStore - Abstract client for versioned document storage.

use async_trait::async_trait;

use super::{Page, QueryFilter, StoreError};
use crate::document::{Document, VersionToken, Versioned};

/// Abstract client for versioned document storage.
///
/// Every successful write assigns a fresh [`VersionToken`]. Implementations
/// must report a stale token on [`replace_if_match`](Self::replace_if_match)
/// as [`StoreError::VersionMismatch`] and nothing else, so callers can branch
/// on conflicts without inspecting messages.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Point read by id and partition key.
    async fn read<T: Document>(
        &self,
        id: &str,
        partition_key: &str,
    ) -> Result<Versioned<T>, StoreError>;

    /// Fetch one page of the documents in `partition_key` matching `filter`.
    ///
    /// Pass the previous page's `continuation` to resume; `None` starts from
    /// the beginning.
    async fn query_page<T: Document>(
        &self,
        partition_key: &str,
        filter: &QueryFilter<T>,
        continuation: Option<&str>,
        page_size: usize,
    ) -> Result<Page<T>, StoreError>;

    /// Replace an existing document if its stored token equals `expected`.
    async fn replace_if_match<T: Document>(
        &self,
        document: &T,
        expected: &VersionToken,
    ) -> Result<Versioned<T>, StoreError>;

    /// Insert or replace a document without a version check.
    async fn upsert<T: Document>(&self, document: &T) -> Result<Versioned<T>, StoreError>;

    /// Insert a new document. Fails if it already exists.
    async fn insert<T: Document>(&self, document: &T) -> Result<Versioned<T>, StoreError>;

    /// Delete a document. Returns true if it existed.
    async fn delete<T: Document>(&self, id: &str, partition_key: &str)
        -> Result<bool, StoreError>;
}
