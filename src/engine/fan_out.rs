use std::collections::BTreeSet;

use futures::stream::{FuturesUnordered, StreamExt};

use crate::document::{Document, Versioned};
use crate::store::{RecordStore, StoreError};

/// How a single conditional write resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    /// The store held a newer version than the one the snapshot was read at.
    Conflicted,
    Failed(StoreError),
}

impl WriteOutcome {
    pub fn classify<T>(result: Result<T, StoreError>) -> Self {
        match result {
            Ok(_) => WriteOutcome::Applied,
            Err(err) if err.is_version_mismatch() => WriteOutcome::Conflicted,
            Err(err) => WriteOutcome::Failed(err),
        }
    }
}

/// Outcomes of one generation's writes, partitioned by kind.
///
/// Every list is sorted by id, so two runs with the same outcomes produce the
/// same result no matter which write finished first.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FanOutResult {
    pub applied: Vec<String>,
    pub conflicted: BTreeSet<String>,
    pub failed: Vec<(String, StoreError)>,
}

impl FanOutResult {
    pub fn submitted(&self) -> usize {
        self.applied.len() + self.conflicted.len() + self.failed.len()
    }

    fn record(&mut self, id: String, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Applied => self.applied.push(id),
            WriteOutcome::Conflicted => {
                self.conflicted.insert(id);
            }
            WriteOutcome::Failed(err) => self.failed.push((id, err)),
        }
    }
}

/// Submit one conditional write per snapshot, all in flight at once, and
/// wait for every one of them to resolve.
///
/// Each write is guarded by the token its snapshot was read with. Outcomes
/// flow back through a single collector; nothing else shares state between
/// the writes.
pub async fn fan_out_writes<S, T>(store: &S, batch: &[Versioned<T>]) -> FanOutResult
where
    S: RecordStore,
    T: Document,
{
    let mut writes: FuturesUnordered<_> = batch
        .iter()
        .map(|snapshot| async move {
            let result = store.replace_if_match(&snapshot.data, &snapshot.version).await;
            (snapshot.id(), WriteOutcome::classify(result))
        })
        .collect();

    let mut result = FanOutResult::default();
    while let Some((id, outcome)) = writes.next().await {
        if outcome == WriteOutcome::Conflicted {
            tracing::debug!(id, "conditional write lost to a newer version");
        }
        result.record(id.to_string(), outcome);
    }

    result.applied.sort();
    result.failed.sort_by(|a, b| a.0.cmp(&b.0));
    result
}
