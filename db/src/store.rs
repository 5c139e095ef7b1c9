use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::StoreError;
use crate::filters::QueryOptions;
use crate::timestamp;

/// A single document: its id plus the decoded JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    pub fn f64_field(&self, name: &str) -> Option<f64> {
        self.field(name).and_then(Value::as_f64)
    }

    pub fn i64_field(&self, name: &str) -> Option<i64> {
        self.field(name).and_then(Value::as_i64)
    }

    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.field(name).and_then(Value::as_bool)
    }

    /// Reads a field as a normalized timestamp, accepting any of the
    /// historical timestamp shapes.
    pub fn timestamp_field(&self, name: &str) -> Option<DateTime<Utc>> {
        self.field(name).and_then(timestamp::normalize_value)
    }
}

/// The document-store client seam.
///
/// Implementations must deep-normalize timestamps on every returned document
/// (see [`crate::timestamp::normalize_document`]) and let backend errors
/// bubble to the caller after logging them; fallback behavior is decided
/// upstream.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches documents from a top-level collection.
    async fn fetch_documents(
        &self,
        collection: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Document>, StoreError>;

    /// Fetches one document by id, `None` when absent.
    async fn fetch_document_by_id(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError>;

    /// Batched fetch by document id; the backend's bounded `in` query over
    /// ids. Callers are responsible for chunking to the backend's limit
    /// (10 ids). An empty id list returns an empty result rather than
    /// issuing an empty-set query.
    async fn fetch_documents_by_ids(
        &self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<Document>, StoreError>;

    /// Fetches documents from `parent_collection/{parent_id}/{sub_path}`,
    /// with the same filter semantics as [`Self::fetch_documents`].
    async fn fetch_subcollection(
        &self,
        parent_collection: &str,
        parent_id: &str,
        sub_path: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Document>, StoreError>;
}
