//! Shared helpers for exercising the document layer in tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::filters::QueryOptions;
use crate::sqlite::SqliteStore;
use crate::store::{Document, DocumentStore};

/// Fresh in-memory document store with the schema applied.
pub async fn setup_test_store() -> SqliteStore {
    SqliteStore::in_memory()
        .await
        .expect("Failed to open in-memory store")
}

/// Seeds one top-level document, panicking on failure.
pub async fn seed_document(store: &SqliteStore, collection: &str, id: &str, data: Value) {
    store
        .upsert_document(collection, id, &data)
        .await
        .expect("Failed to seed document");
}

/// Seeds one sub-collection document, panicking on failure.
pub async fn seed_subdocument(
    store: &SqliteStore,
    parent_collection: &str,
    parent_id: &str,
    sub_path: &str,
    id: &str,
    data: Value,
) {
    store
        .upsert_subdocument(parent_collection, parent_id, sub_path, id, &data)
        .await
        .expect("Failed to seed subdocument");
}

/// Delegating wrapper that counts every store call, for asserting cache
/// hits perform zero fetches.
pub struct CountingStore {
    inner: Arc<dyn DocumentStore>,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn fetch_documents(
        &self,
        collection: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Document>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_documents(collection, options).await
    }

    async fn fetch_document_by_id(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_document_by_id(collection, id).await
    }

    async fn fetch_documents_by_ids(
        &self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<Document>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_documents_by_ids(collection, ids).await
    }

    async fn fetch_subcollection(
        &self,
        parent_collection: &str,
        parent_id: &str,
        sub_path: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Document>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .fetch_subcollection(parent_collection, parent_id, sub_path, options)
            .await
    }
}

/// Store stub whose every call fails, for exercising the contain-and-degrade
/// path in aggregation code.
pub struct FailingStore;

/// A representative backend failure, for store stubs in this crate and
/// downstream service tests.
pub fn upstream_unavailable() -> StoreError {
    StoreError::Database(sqlx::Error::PoolClosed)
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn fetch_documents(
        &self,
        _collection: &str,
        _options: &QueryOptions,
    ) -> Result<Vec<Document>, StoreError> {
        Err(upstream_unavailable())
    }

    async fn fetch_document_by_id(
        &self,
        _collection: &str,
        _id: &str,
    ) -> Result<Option<Document>, StoreError> {
        Err(upstream_unavailable())
    }

    async fn fetch_documents_by_ids(
        &self,
        _collection: &str,
        _ids: &[String],
    ) -> Result<Vec<Document>, StoreError> {
        Err(upstream_unavailable())
    }

    async fn fetch_subcollection(
        &self,
        _parent_collection: &str,
        _parent_id: &str,
        _sub_path: &str,
        _options: &QueryOptions,
    ) -> Result<Vec<Document>, StoreError> {
        Err(upstream_unavailable())
    }
}
