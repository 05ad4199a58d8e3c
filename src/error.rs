use std::time::Duration;

use crate::engine::BulkUpdateReport;
use crate::store::StoreError;

/// Terminal failure of a bulk update invocation.
///
/// Version conflicts never show up here on their own; they are retried
/// until the generation budget, deadline, or a cancellation ends the run.
#[derive(Debug, thiserror::Error)]
pub enum BulkUpdateError {
    /// Draining the working-set query failed.
    #[error("working-set query on partition {partition_key} failed: {source}")]
    Query {
        partition_key: String,
        #[source]
        source: StoreError,
    },
    /// Re-reading a conflicted document failed for a reason other than absence.
    #[error("re-read of conflicted document {id} failed: {source}")]
    Read {
        id: String,
        #[source]
        source: StoreError,
    },
    /// A document that lost a version race was gone when re-read.
    #[error("conflicted document {id} disappeared before it could be re-read")]
    Vanished { id: String },
    /// A conditional write failed with something other than a version mismatch.
    /// Every other write of the generation had resolved by then.
    #[error("conditional write of {id} failed: {source}")]
    Write {
        id: String,
        #[source]
        source: StoreError,
        report: Box<BulkUpdateReport>,
    },
    /// Conflicts remained after the last allowed generation.
    #[error("bulk update did not converge after {generations} generations ({} documents still conflicted)", .pending.len())]
    NotConverged {
        generations: u32,
        pending: Vec<String>,
        report: Box<BulkUpdateReport>,
    },
    /// The deadline passed before the next retry generation could start.
    #[error("bulk update deadline exceeded after {elapsed:?} ({} documents still conflicted)", .pending.len())]
    DeadlineExceeded {
        elapsed: Duration,
        pending: Vec<String>,
        report: Box<BulkUpdateReport>,
    },
    /// Cancellation was requested before a generation started or before its
    /// writes were dispatched. `report` holds only generations that wrote.
    #[error("bulk update cancelled ({} documents still pending)", .pending.len())]
    Cancelled {
        pending: Vec<String>,
        report: Box<BulkUpdateReport>,
    },
}

impl BulkUpdateError {
    /// Partial report of the generations that completed, when one exists.
    pub fn report(&self) -> Option<&BulkUpdateReport> {
        match self {
            BulkUpdateError::Write { report, .. }
            | BulkUpdateError::NotConverged { report, .. }
            | BulkUpdateError::DeadlineExceeded { report, .. }
            | BulkUpdateError::Cancelled { report, .. } => Some(report),
            _ => None,
        }
    }

    /// Ids left unwritten when the run stopped early.
    pub fn pending(&self) -> &[String] {
        match self {
            BulkUpdateError::NotConverged { pending, .. }
            | BulkUpdateError::DeadlineExceeded { pending, .. }
            | BulkUpdateError::Cancelled { pending, .. } => pending,
            _ => &[],
        }
    }

    /// The underlying store failure, if the run died on one.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            BulkUpdateError::Query { source, .. }
            | BulkUpdateError::Read { source, .. }
            | BulkUpdateError::Write { source, .. } => Some(source),
            _ => None,
        }
    }

    /// True when a transient store failure ended the run; the whole
    /// invocation may be retried by the caller.
    pub fn is_transient(&self) -> bool {
        self.store_error().is_some_and(StoreError::is_transient)
    }
}
