//! Documents - Versioned records held by a remote store.
//!
//! A document is addressed by `(id, partition_key)` and carries an opaque
//! [`VersionToken`] assigned by the store on every successful write. The
//! engine only ever compares tokens for equality.
//!
//! ## Example
//!
//! ```ignore
//! use bulk_graph::{Document, Versioned};
//!
//! #[derive(Serialize, Deserialize, Clone)]
//! struct Device {
//!     pub id: String,
//!     pub pk: String,
//!     pub temp: i64,
//! }
//!
//! impl Document for Device {
//!     const COLLECTION: &'static str = "devices";
//!     fn id(&self) -> &str { &self.id }
//!     fn partition_key(&self) -> &str { &self.pk }
//! }
//! ```

mod vertex;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

/// Trait for types that can be stored as documents.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The collection (container) name for this document type.
    const COLLECTION: &'static str;

    /// Returns the document id, unique within its partition.
    fn id(&self) -> &str;

    /// Returns the partition key value the document lives under.
    fn partition_key(&self) -> &str;
}

/// Opaque version token (an etag) attached to every stored document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        VersionToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionToken {
    fn from(token: &str) -> Self {
        VersionToken::new(token)
    }
}

/// A snapshot of document data as it was read, paired with the token the
/// store held at read time.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub data: T,
    pub version: VersionToken,
}

impl<T: Document> Versioned<T> {
    pub fn id(&self) -> &str {
        self.data.id()
    }
}

pub use vertex::{PropertyValue, Vertex, VertexProperty};
