use std::collections::BTreeSet;

use futures::stream::{FuturesUnordered, StreamExt};

use crate::document::{Document, Versioned};
use crate::error::BulkUpdateError;
use crate::store::{QueryFilter, RecordStore};

/// Build one generation's working set.
///
/// With no conflicts this drains the partition query page by page. Otherwise
/// it re-reads exactly the conflicted ids, all at once, and nothing else.
/// Output is ordered by id.
pub async fn select_working_set<S, T>(
    store: &S,
    partition_key: &str,
    filter: &QueryFilter<T>,
    conflicts: &BTreeSet<String>,
    page_size: usize,
) -> Result<Vec<Versioned<T>>, BulkUpdateError>
where
    S: RecordStore,
    T: Document,
{
    if conflicts.is_empty() {
        query_partition(store, partition_key, filter, page_size).await
    } else {
        reread_conflicts(store, partition_key, conflicts).await
    }
}

async fn query_partition<S, T>(
    store: &S,
    partition_key: &str,
    filter: &QueryFilter<T>,
    page_size: usize,
) -> Result<Vec<Versioned<T>>, BulkUpdateError>
where
    S: RecordStore,
    T: Document,
{
    let mut working_set = Vec::new();
    let mut continuation: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = store
            .query_page(partition_key, filter, continuation.as_deref(), page_size)
            .await
            .map_err(|source| BulkUpdateError::Query {
                partition_key: partition_key.to_string(),
                source,
            })?;
        pages += 1;
        working_set.extend(page.items);

        match page.continuation {
            Some(next) => continuation = Some(next),
            None => break,
        }
    }

    working_set.sort_by(|a, b| a.id().cmp(b.id()));
    tracing::debug!(
        partition = partition_key,
        pages,
        documents = working_set.len(),
        "drained working-set query"
    );
    Ok(working_set)
}

async fn reread_conflicts<S, T>(
    store: &S,
    partition_key: &str,
    conflicts: &BTreeSet<String>,
) -> Result<Vec<Versioned<T>>, BulkUpdateError>
where
    S: RecordStore,
    T: Document,
{
    let mut reads: FuturesUnordered<_> = conflicts
        .iter()
        .map(|id| async move { (id, store.read::<T>(id, partition_key).await) })
        .collect();

    let mut working_set = Vec::with_capacity(conflicts.len());
    let mut failures = Vec::new();
    while let Some((id, result)) = reads.next().await {
        match result {
            Ok(snapshot) => working_set.push(snapshot),
            Err(source) => failures.push((id, source)),
        }
    }

    // Report the lowest failing id so the error does not depend on completion order.
    failures.sort_by(|a, b| a.0.cmp(b.0));
    if let Some((id, source)) = failures.into_iter().next() {
        return Err(if source.is_not_found() {
            BulkUpdateError::Vanished { id: id.clone() }
        } else {
            BulkUpdateError::Read {
                id: id.clone(),
                source,
            }
        });
    }

    working_set.sort_by(|a, b| a.id().cmp(b.id()));
    Ok(working_set)
}
