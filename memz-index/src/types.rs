//! Core type definitions for the index engine.

use serde::{Deserialize, Serialize};

/// Opaque record identifier, unique within one index generation.
pub type RecordId = String;

/// Record timestamp (milliseconds by convention; any totally ordered epoch works).
pub type Timestamp = i64;

/// The unit of storage: a structured record looked up by id, tag and time.
///
/// Records are immutable for the lifetime of a generation and shared as
/// `Arc<Record>` between the indexes, the cache and callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier.
    pub id: RecordId,
    /// Tags, in authoring order. Duplicates are indexed once.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last modification time; keys the time index and the version hash.
    pub updated_at: Timestamp,
    /// Importance, conventionally 0–10 but not clamped.
    #[serde(default)]
    pub importance: f64,
    /// Application data, carried through unmodified.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Record {
    /// Create a record with an empty payload.
    ///
    /// `created_at` and `updated_at` both start at `timestamp`.
    #[must_use]
    pub fn new<I, S>(id: impl Into<RecordId>, tags: I, timestamp: Timestamp, importance: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            tags: tags.into_iter().map(Into::into).collect(),
            created_at: timestamp,
            updated_at: timestamp,
            importance,
            payload: serde_json::Value::Null,
        }
    }

    /// Builder-style override of `updated_at`.
    #[must_use]
    pub fn with_updated_at(mut self, updated_at: Timestamp) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Builder-style payload attachment.
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Whether the record carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
