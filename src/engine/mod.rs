//! Engine - Bulk optimistic updates converging through conflict-driven retries.
//!
//! Each generation selects a working set, mutates every snapshot in memory,
//! drops guard-rejected documents, and submits all remaining writes
//! concurrently under their read-time version tokens. Ids whose write lost a
//! version race are re-read and retried in the next generation; everything
//! else is settled for good.
//!
//! ## Example
//!
//! ```ignore
//! use bulk_graph::{
//!     BulkUpdate, BulkUpdater, IncrementNumber, InMemoryRecordStore, MutationPlan, NumberBelow,
//! };
//!
//! let plan = MutationPlan::new(IncrementNumber::new("temp", 20))
//!     .with_guard(NumberBelow::new("temp", 140));
//! let update = BulkUpdate::new("fleet1", plan);
//!
//! let report = BulkUpdater::new(store).execute(&update).await?;
//! println!("applied {} in {} generations", report.applied_count(), report.generation_count());
//! ```

mod cancel;
mod config;
mod fan_out;
mod hooks;
mod report;
mod selector;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::document::Document;
use crate::error::BulkUpdateError;
use crate::mutation::{MutationPlan, Prepared};
use crate::store::{QueryFilter, RecordStore};

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use config::BulkUpdateConfig;
pub use fan_out::{fan_out_writes, FanOutResult, WriteOutcome};
pub use hooks::{BeforeWrite, NoopHook, SettleDelay};
pub use report::{BulkUpdateReport, GenerationReport};
pub use selector::select_working_set;

/// One bulk update intent: which documents, and what to do to them.
pub struct BulkUpdate<T> {
    partition_key: String,
    filter: QueryFilter<T>,
    plan: MutationPlan<T>,
    hook: Arc<dyn BeforeWrite<T>>,
}

impl<T: Document> BulkUpdate<T> {
    /// Update every document in `partition_key` with `plan`.
    pub fn new(partition_key: impl Into<String>, plan: MutationPlan<T>) -> Self {
        BulkUpdate {
            partition_key: partition_key.into(),
            filter: QueryFilter::all(),
            plan,
            hook: Arc::new(NoopHook),
        }
    }

    /// Narrow the initial working set to documents matching `filter`.
    pub fn with_filter(mut self, filter: QueryFilter<T>) -> Self {
        self.filter = filter;
        self
    }

    /// Run `hook` before each generation's writes are dispatched.
    pub fn with_before_write(mut self, hook: impl BeforeWrite<T> + 'static) -> Self {
        self.hook = Arc::new(hook);
        self
    }

    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    pub fn plan(&self) -> &MutationPlan<T> {
        &self.plan
    }
}

impl<T> fmt::Debug for BulkUpdate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkUpdate")
            .field("partition_key", &self.partition_key)
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

/// Drives bulk updates against a [`RecordStore`].
pub struct BulkUpdater<S> {
    store: S,
    config: BulkUpdateConfig,
    cancel: Option<CancelSignal>,
}

impl<S> BulkUpdater<S> {
    pub fn new(store: S) -> Self {
        BulkUpdater {
            store,
            config: BulkUpdateConfig::default(),
            cancel: None,
        }
    }

    pub fn with_config(mut self, config: BulkUpdateConfig) -> Self {
        self.config = config;
        self
    }

    /// Stop starting new generations once `signal` fires.
    pub fn with_cancel(mut self, signal: CancelSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &BulkUpdateConfig {
        &self.config
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelSignal::is_cancelled)
    }
}

impl<S: RecordStore> BulkUpdater<S> {
    /// Run `update` until every selected document is applied or guard-rejected.
    ///
    /// Generations run strictly one after another; within a generation all
    /// reads and writes are concurrent. Returns the per-generation report on
    /// convergence.
    pub async fn execute<T: Document>(
        &self,
        update: &BulkUpdate<T>,
    ) -> Result<BulkUpdateReport, BulkUpdateError> {
        let started = Instant::now();
        let limit = self.config.generation_limit();
        let page_size = self.config.effective_page_size();
        let mut report = BulkUpdateReport::default();
        let mut conflicts: BTreeSet<String> = BTreeSet::new();

        tracing::info!(
            collection = T::COLLECTION,
            partition = %update.partition_key,
            max_generations = limit,
            "starting bulk update"
        );

        for generation in 0..limit {
            if self.is_cancelled() {
                tracing::warn!(generation, pending = conflicts.len(), "bulk update cancelled");
                return Err(BulkUpdateError::Cancelled {
                    pending: conflicts.into_iter().collect(),
                    report: Box::new(report),
                });
            }

            if generation > 0 {
                if let Some(deadline) = self.config.deadline() {
                    let elapsed = started.elapsed();
                    if elapsed >= deadline {
                        tracing::warn!(
                            generation,
                            pending = conflicts.len(),
                            elapsed_ms = elapsed.as_millis() as u64,
                            "bulk update deadline exceeded"
                        );
                        return Err(BulkUpdateError::DeadlineExceeded {
                            elapsed,
                            pending: conflicts.into_iter().collect(),
                            report: Box::new(report),
                        });
                    }
                }
            }

            let working_set = select_working_set(
                &self.store,
                &update.partition_key,
                &update.filter,
                &conflicts,
                page_size,
            )
            .await?;

            let mut entry = GenerationReport::new(generation);
            entry.selected = working_set.iter().map(|v| v.id().to_string()).collect();

            let mut batch = Vec::with_capacity(working_set.len());
            for snapshot in working_set {
                match update.plan.prepare(snapshot) {
                    Prepared::Write(mutated) => batch.push(mutated),
                    Prepared::Rejected(id) => entry.guard_rejected.push(id),
                }
            }

            if !entry.guard_rejected.is_empty() {
                tracing::debug!(
                    generation,
                    rejected = ?entry.guard_rejected,
                    "guard excluded documents from the write set"
                );
            }

            update.hook.before_write(generation, &batch).await;

            if self.is_cancelled() {
                let pending: Vec<String> = batch.iter().map(|v| v.id().to_string()).collect();
                tracing::warn!(
                    generation,
                    pending = pending.len(),
                    "bulk update cancelled before dispatching writes"
                );
                return Err(BulkUpdateError::Cancelled {
                    pending,
                    report: Box::new(report),
                });
            }

            let outcome = fan_out_writes(&self.store, &batch).await;
            entry.applied = outcome.applied;
            entry.conflicted = outcome.conflicted.iter().cloned().collect();

            tracing::info!(
                generation,
                selected = entry.selected.len(),
                guard_rejected = entry.guard_rejected.len(),
                applied = entry.applied.len(),
                conflicted = entry.conflicted.len(),
                failed = outcome.failed.len(),
                "generation resolved"
            );
            report.generations.push(entry);

            if let Some((id, source)) = outcome.failed.into_iter().next() {
                tracing::error!(generation, %id, error = %source, "conditional write failed");
                return Err(BulkUpdateError::Write {
                    id,
                    source,
                    report: Box::new(report),
                });
            }

            if outcome.conflicted.is_empty() {
                tracing::info!(
                    generations = report.generation_count(),
                    applied = report.applied_count(),
                    guard_rejected = report.guard_rejected_count(),
                    "bulk update converged"
                );
                return Ok(report);
            }

            tracing::warn!(
                generation,
                conflicts = outcome.conflicted.len(),
                "retrying documents that lost a version race"
            );
            conflicts = outcome.conflicted;
        }

        tracing::warn!(
            generations = limit,
            pending = conflicts.len(),
            "bulk update did not converge"
        );
        Err(BulkUpdateError::NotConverged {
            generations: limit,
            pending: conflicts.into_iter().collect(),
            report: Box::new(report),
        })
    }
}
