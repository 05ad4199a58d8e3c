//! Store wrapper that counts traffic and injects failures.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bulk_graph::{
    async_trait, Document, InMemoryRecordStore, Page, QueryFilter, RecordStore, StoreError,
    VersionToken, Versioned,
};

#[derive(Default)]
struct Traffic {
    writes: HashMap<String, usize>,
    reads: HashMap<String, usize>,
    queries: usize,
}

#[derive(Clone, Default)]
pub struct InstrumentedStore {
    inner: InMemoryRecordStore,
    traffic: Arc<Mutex<Traffic>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
    reads_in_flight: Arc<AtomicUsize>,
    peak_reads_in_flight: Arc<AtomicUsize>,
    write_latency: Option<Duration>,
    read_latency: Option<Duration>,
    transient_writes: HashSet<String>,
    transient_reads: HashSet<String>,
    transient_queries: bool,
    delete_on_conflict: bool,
}

impl InstrumentedStore {
    pub fn new(inner: &InMemoryRecordStore) -> Self {
        InstrumentedStore {
            inner: inner.clone(),
            ..Default::default()
        }
    }

    /// Every conditional write sleeps this long before reaching the store.
    pub fn with_write_latency(mut self, latency: Duration) -> Self {
        self.write_latency = Some(latency);
        self
    }

    /// Every point read sleeps this long before reaching the store.
    pub fn with_read_latency(mut self, latency: Duration) -> Self {
        self.read_latency = Some(latency);
        self
    }

    /// Point reads of `id` fail with a transient error.
    pub fn with_transient_read(mut self, id: &str) -> Self {
        self.transient_reads.insert(id.to_string());
        self
    }

    /// Conditional writes of `id` fail with a transient error.
    pub fn with_transient_write(mut self, id: &str) -> Self {
        self.transient_writes.insert(id.to_string());
        self
    }

    /// Every query page fails with a transient error.
    pub fn with_transient_queries(mut self) -> Self {
        self.transient_queries = true;
        self
    }

    /// Delete a document right after its write loses a version race.
    pub fn with_delete_on_conflict(mut self) -> Self {
        self.delete_on_conflict = true;
        self
    }

    pub fn writes_of(&self, id: &str) -> usize {
        self.traffic.lock().unwrap().writes.get(id).copied().unwrap_or(0)
    }

    pub fn reads_of(&self, id: &str) -> usize {
        self.traffic.lock().unwrap().reads.get(id).copied().unwrap_or(0)
    }

    pub fn total_reads(&self) -> usize {
        self.traffic.lock().unwrap().reads.values().sum()
    }

    pub fn queries(&self) -> usize {
        self.traffic.lock().unwrap().queries
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn peak_reads_in_flight(&self) -> usize {
        self.peak_reads_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for InstrumentedStore {
    async fn read<T: Document>(
        &self,
        id: &str,
        partition_key: &str,
    ) -> Result<Versioned<T>, StoreError> {
        *self
            .traffic
            .lock()
            .unwrap()
            .reads
            .entry(id.to_string())
            .or_default() += 1;

        let now = self.reads_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_reads_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(latency) = self.read_latency {
            tokio::time::sleep(latency).await;
        }
        self.reads_in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.transient_reads.contains(id) {
            return Err(StoreError::Transient("service unavailable".into()));
        }
        self.inner.read(id, partition_key).await
    }

    async fn query_page<T: Document>(
        &self,
        partition_key: &str,
        filter: &QueryFilter<T>,
        continuation: Option<&str>,
        page_size: usize,
    ) -> Result<Page<T>, StoreError> {
        self.traffic.lock().unwrap().queries += 1;
        if self.transient_queries {
            return Err(StoreError::Transient("request rate too large".into()));
        }
        self.inner
            .query_page(partition_key, filter, continuation, page_size)
            .await
    }

    async fn replace_if_match<T: Document>(
        &self,
        document: &T,
        expected: &VersionToken,
    ) -> Result<Versioned<T>, StoreError> {
        *self
            .traffic
            .lock()
            .unwrap()
            .writes
            .entry(document.id().to_string())
            .or_default() += 1;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(latency) = self.write_latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.transient_writes.contains(document.id()) {
            return Err(StoreError::Transient("request timed out".into()));
        }

        let result = self.inner.replace_if_match(document, expected).await;
        if self.delete_on_conflict && matches!(result, Err(StoreError::VersionMismatch { .. })) {
            self.inner
                .delete::<T>(document.id(), document.partition_key())
                .await?;
        }
        result
    }

    async fn upsert<T: Document>(&self, document: &T) -> Result<Versioned<T>, StoreError> {
        self.inner.upsert(document).await
    }

    async fn insert<T: Document>(&self, document: &T) -> Result<Versioned<T>, StoreError> {
        self.inner.insert(document).await
    }

    async fn delete<T: Document>(
        &self,
        id: &str,
        partition_key: &str,
    ) -> Result<bool, StoreError> {
        self.inner.delete::<T>(id, partition_key).await
    }
}
