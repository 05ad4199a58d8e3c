//! InMemoryRecordStore - HashMap-backed record store for testing and development.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use super::{Page, QueryFilter, RecordStore, StoreError};
use crate::document::{Document, VersionToken, Versioned};

/// Internal stored representation of a document.
struct StoredRecord {
    bytes: Vec<u8>,
    etag: VersionToken,
}

/// In-memory record store backed by a HashMap.
///
/// Storage key is `"COLLECTION:partition:id"`. Clone-friendly via Arc, so a
/// clone can play the part of a concurrent writer in tests.
#[derive(Clone)]
pub struct InMemoryRecordStore {
    storage: Arc<RwLock<HashMap<String, StoredRecord>>>,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRecordStore {
    /// Create a new empty record store.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored documents across all collections.
    pub fn len(&self) -> usize {
        self.storage
            .read()
            .map(|s| s.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn make_key(collection: &str, partition_key: &str, id: &str) -> String {
        format!("{}:{}:{}", collection, partition_key, id)
    }

    fn next_etag() -> VersionToken {
        VersionToken::new(format!("\"{}\"", Uuid::new_v4()))
    }

    fn not_found<T: Document>(id: &str) -> StoreError {
        StoreError::NotFound {
            collection: T::COLLECTION.to_string(),
            id: id.to_string(),
        }
    }

    fn read_sync<T: Document>(
        &self,
        id: &str,
        partition_key: &str,
    ) -> Result<Versioned<T>, StoreError> {
        let key = Self::make_key(T::COLLECTION, partition_key, id);
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        let stored = storage.get(&key).ok_or_else(|| Self::not_found::<T>(id))?;
        let data: T = serde_json::from_slice(&stored.bytes)?;
        Ok(Versioned {
            data,
            version: stored.etag.clone(),
        })
    }

    fn query_sync<T: Document>(
        &self,
        partition_key: &str,
        filter: &QueryFilter<T>,
        continuation: Option<&str>,
        page_size: usize,
    ) -> Result<Page<T>, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        let prefix = format!("{}:{}:", T::COLLECTION, partition_key);
        let mut matches: Vec<(&str, &StoredRecord)> = storage
            .iter()
            .filter_map(|(key, stored)| key.strip_prefix(&prefix).map(|id| (id, stored)))
            .filter(|(id, _)| continuation.map_or(true, |after| *id > after))
            .collect();
        matches.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let page_size = page_size.max(1);
        let mut items = Vec::new();
        let mut last_id = None;
        let mut more = false;

        for (id, stored) in matches {
            if items.len() == page_size {
                more = true;
                break;
            }
            last_id = Some(id);
            let data: T = serde_json::from_slice(&stored.bytes)?;
            if filter.matches(&data) {
                items.push(Versioned {
                    data,
                    version: stored.etag.clone(),
                });
            }
        }

        Ok(Page {
            items,
            continuation: if more { last_id.map(str::to_string) } else { None },
        })
    }

    fn write_sync<T: Document>(
        &self,
        document: &T,
        precondition: Precondition<'_>,
    ) -> Result<Versioned<T>, StoreError> {
        let key = Self::make_key(T::COLLECTION, document.partition_key(), document.id());
        let bytes = serde_json::to_vec(document)?;

        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        match (precondition, storage.get(&key)) {
            (Precondition::IfMatch(_), None) => return Err(Self::not_found::<T>(document.id())),
            (Precondition::IfMatch(expected), Some(stored)) if &stored.etag != expected => {
                return Err(StoreError::VersionMismatch {
                    collection: T::COLLECTION.to_string(),
                    id: document.id().to_string(),
                    expected: expected.clone(),
                    actual: stored.etag.clone(),
                });
            }
            (Precondition::IfNoneMatch, Some(_)) => {
                return Err(StoreError::AlreadyExists {
                    collection: T::COLLECTION.to_string(),
                    id: document.id().to_string(),
                });
            }
            _ => {}
        }

        let etag = Self::next_etag();
        storage.insert(
            key,
            StoredRecord {
                bytes,
                etag: etag.clone(),
            },
        );

        Ok(Versioned {
            data: document.clone(),
            version: etag,
        })
    }

    fn delete_sync<T: Document>(&self, id: &str, partition_key: &str) -> Result<bool, StoreError> {
        let key = Self::make_key(T::COLLECTION, partition_key, id);
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        Ok(storage.remove(&key).is_some())
    }
}

enum Precondition<'a> {
    Unconditional,
    IfMatch(&'a VersionToken),
    IfNoneMatch,
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn read<T: Document>(
        &self,
        id: &str,
        partition_key: &str,
    ) -> Result<Versioned<T>, StoreError> {
        self.read_sync(id, partition_key)
    }

    async fn query_page<T: Document>(
        &self,
        partition_key: &str,
        filter: &QueryFilter<T>,
        continuation: Option<&str>,
        page_size: usize,
    ) -> Result<Page<T>, StoreError> {
        self.query_sync(partition_key, filter, continuation, page_size)
    }

    async fn replace_if_match<T: Document>(
        &self,
        document: &T,
        expected: &VersionToken,
    ) -> Result<Versioned<T>, StoreError> {
        self.write_sync(document, Precondition::IfMatch(expected))
    }

    async fn upsert<T: Document>(&self, document: &T) -> Result<Versioned<T>, StoreError> {
        self.write_sync(document, Precondition::Unconditional)
    }

    async fn insert<T: Document>(&self, document: &T) -> Result<Versioned<T>, StoreError> {
        self.write_sync(document, Precondition::IfNoneMatch)
    }

    async fn delete<T: Document>(
        &self,
        id: &str,
        partition_key: &str,
    ) -> Result<bool, StoreError> {
        self.delete_sync::<T>(id, partition_key)
    }
}
