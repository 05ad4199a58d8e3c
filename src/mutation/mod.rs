//! Mutations - Per-document transformations and the guards that bound them.
//!
//! A [`MutationPlan`] applies one [`Mutation`] to an in-memory snapshot, then
//! asks the optional [`Guard`] whether the *mutated* value may be written.
//! Rejected documents are never submitted to the store.

mod vertex;

use std::fmt;
use std::sync::Arc;

use crate::document::{Document, Versioned};

/// A deterministic transformation of one document.
pub trait Mutation<T>: Send + Sync {
    fn apply(&self, document: &mut T);
}

impl<T, F> Mutation<T> for F
where
    F: Fn(&mut T) + Send + Sync,
{
    fn apply(&self, document: &mut T) {
        self(document)
    }
}

/// Eligibility check run against the mutated document before it is written.
pub trait Guard<T>: Send + Sync {
    fn allows(&self, document: &T) -> bool;
}

impl<T, F> Guard<T> for F
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn allows(&self, document: &T) -> bool {
        self(document)
    }
}

/// Result of preparing one snapshot for writing.
#[derive(Debug, Clone)]
pub enum Prepared<T> {
    /// Mutated snapshot, still carrying the token it was read with.
    Write(Versioned<T>),
    /// The guard refused the mutated value; carries the document id.
    Rejected(String),
}

/// A mutation paired with an optional guard.
pub struct MutationPlan<T> {
    mutation: Arc<dyn Mutation<T>>,
    guard: Option<Arc<dyn Guard<T>>>,
}

impl<T: Document> MutationPlan<T> {
    pub fn new(mutation: impl Mutation<T> + 'static) -> Self {
        MutationPlan {
            mutation: Arc::new(mutation),
            guard: None,
        }
    }

    /// Only write documents whose mutated value passes `guard`.
    pub fn with_guard(mut self, guard: impl Guard<T> + 'static) -> Self {
        self.guard = Some(Arc::new(guard));
        self
    }

    pub fn has_guard(&self) -> bool {
        self.guard.is_some()
    }

    /// Mutate the snapshot in place and evaluate the guard on the result.
    pub fn prepare(&self, mut snapshot: Versioned<T>) -> Prepared<T> {
        self.mutation.apply(&mut snapshot.data);

        match &self.guard {
            Some(guard) if !guard.allows(&snapshot.data) => {
                Prepared::Rejected(snapshot.data.id().to_string())
            }
            _ => Prepared::Write(snapshot),
        }
    }
}

impl<T> Clone for MutationPlan<T> {
    fn clone(&self) -> Self {
        MutationPlan {
            mutation: Arc::clone(&self.mutation),
            guard: self.guard.clone(),
        }
    }
}

impl<T> fmt::Debug for MutationPlan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationPlan")
            .field("guarded", &self.guard.is_some())
            .finish_non_exhaustive()
    }
}

pub use vertex::{IncrementNumber, NumberBelow, SetText};
