mod document;
mod engine;
mod error;
mod mutation;
mod store;

pub use document::{Document, PropertyValue, VersionToken, Versioned, Vertex, VertexProperty};
pub use engine::{
    cancel_pair, fan_out_writes, select_working_set, BeforeWrite, BulkUpdate, BulkUpdateConfig,
    BulkUpdateReport, BulkUpdater, CancelHandle, CancelSignal, FanOutResult, GenerationReport,
    NoopHook, SettleDelay, WriteOutcome,
};
pub use error::BulkUpdateError;
pub use mutation::{Guard, IncrementNumber, Mutation, MutationPlan, NumberBelow, Prepared, SetText};
pub use store::{InMemoryRecordStore, Page, QueryFilter, RecordStore, StoreError};

// Re-exported so store implementations and hooks can use the same macro version
pub use async_trait::async_trait;
