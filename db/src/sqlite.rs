//! Embedded SQLite-backed document store.
//!
//! One generic `documents` table keyed by (collection, parent, doc_id) with a
//! JSON body column. Filters, ordering and limits are applied in process
//! after the collection scan; predicate pushdown is the production backend's
//! concern and this implementation exists for local development, seeding and
//! tests. Session-scale collections (tens to hundreds of documents) keep the
//! scan cheap.

use std::cmp::Ordering;
use std::str::FromStr;

use async_trait::async_trait;
use log::error;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use crate::error::StoreError;
use crate::filters::{QueryOptions, SortDirection};
use crate::store::{Document, DocumentStore};
use crate::timestamp;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    parent     TEXT NOT NULL DEFAULT '',
    doc_id     TEXT NOT NULL,
    data       TEXT NOT NULL,
    PRIMARY KEY (collection, parent, doc_id)
)
"#;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if necessary) a file-backed store.
    pub async fn connect(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .unwrap_or_else(|_| SqliteConnectOptions::new().filename(path))
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// In-memory store for tests and demos. Single connection: each SQLite
    /// `:memory:` connection is its own database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .expect("valid in-memory DSN");
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Inserts or replaces a top-level document.
    pub async fn upsert_document(
        &self,
        collection: &str,
        id: &str,
        data: &Value,
    ) -> Result<(), StoreError> {
        self.upsert_with_parent(collection, "", id, data).await
    }

    /// Inserts or replaces a document under
    /// `parent_collection/{parent_id}/{sub_path}`.
    pub async fn upsert_subdocument(
        &self,
        parent_collection: &str,
        parent_id: &str,
        sub_path: &str,
        id: &str,
        data: &Value,
    ) -> Result<(), StoreError> {
        let parent = format!("{parent_collection}/{parent_id}");
        self.upsert_with_parent(sub_path, &parent, id, data).await
    }

    async fn upsert_with_parent(
        &self,
        collection: &str,
        parent: &str,
        id: &str,
        data: &Value,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT OR REPLACE INTO documents (collection, parent, doc_id, data) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(collection)
        .bind(parent)
        .bind(id)
        .bind(data.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn scan(
        &self,
        collection: &str,
        parent: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query(
            "SELECT doc_id, data FROM documents \
             WHERE collection = ? AND parent = ? ORDER BY doc_id",
        )
        .bind(collection)
        .bind(parent)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("document scan failed for {parent}/{collection}: {e}");
            e
        })?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("doc_id");
            let raw: String = row.get("data");
            let mut data: Value = serde_json::from_str(&raw).map_err(|source| {
                error!("malformed document body in {collection}/{id}");
                StoreError::MalformedDocument {
                    collection: collection.to_string(),
                    id: id.clone(),
                    source,
                }
            })?;
            timestamp::normalize_document(&mut data);
            if options.matches(&data) {
                documents.push(Document::new(id, data));
            }
        }

        if let Some(order) = &options.order_by {
            documents.sort_by(|a, b| {
                let ordering = compare_fields(a.field(&order.field), b.field(&order.field));
                match order.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = options.limit {
            documents.truncate(limit);
        }

        Ok(documents)
    }
}

/// Field comparison for ordering: numbers numerically, strings lexically
/// (normalized RFC 3339 timestamps order chronologically this way), missing
/// fields last.
fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn fetch_documents(
        &self,
        collection: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Document>, StoreError> {
        self.scan(collection, "", options).await
    }

    async fn fetch_document_by_id(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query(
            "SELECT data FROM documents \
             WHERE collection = ? AND parent = '' AND doc_id = ?",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("document lookup failed for {collection}/{id}: {e}");
            e
        })?;

        match row {
            Some(row) => {
                let raw: String = row.get("data");
                let mut data: Value = serde_json::from_str(&raw).map_err(|source| {
                    error!("malformed document body in {collection}/{id}");
                    StoreError::MalformedDocument {
                        collection: collection.to_string(),
                        id: id.to_string(),
                        source,
                    }
                })?;
                timestamp::normalize_document(&mut data);
                Ok(Some(Document::new(id, data)))
            }
            None => Ok(None),
        }
    }

    async fn fetch_documents_by_ids(
        &self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<Document>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT doc_id, data FROM documents \
             WHERE collection = ? AND parent = '' AND doc_id IN ({placeholders}) \
             ORDER BY doc_id"
        );
        let mut query = sqlx::query(&sql).bind(collection);
        for id in ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(|e| {
            error!("batched document lookup failed for {collection}: {e}");
            e
        })?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("doc_id");
            let raw: String = row.get("data");
            let mut data: Value = serde_json::from_str(&raw).map_err(|source| {
                error!("malformed document body in {collection}/{id}");
                StoreError::MalformedDocument {
                    collection: collection.to_string(),
                    id: id.clone(),
                    source,
                }
            })?;
            timestamp::normalize_document(&mut data);
            documents.push(Document::new(id, data));
        }
        Ok(documents)
    }

    async fn fetch_subcollection(
        &self,
        parent_collection: &str,
        parent_id: &str,
        sub_path: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let parent = format!("{parent_collection}/{parent_id}");
        self.scan(sub_path, &parent, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FieldFilter;
    use serde_json::json;

    #[tokio::test]
    async fn file_backed_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("documents.db");
        let path = path.to_str().unwrap();

        {
            let store = SqliteStore::connect(path).await.unwrap();
            store
                .upsert_document("users", "u1", &json!({"email": "a@b.c"}))
                .await
                .unwrap();
        }

        let reopened = SqliteStore::connect(path).await.unwrap();
        let doc = reopened.fetch_document_by_id("users", "u1").await.unwrap();
        assert_eq!(doc.unwrap().str_field("email"), Some("a@b.c"));
    }

    #[tokio::test]
    async fn fetch_by_id_round_trips() {
        let store = SqliteStore::in_memory().await.unwrap();
        store
            .upsert_document("users", "u1", &json!({"email": "a@b.c"}))
            .await
            .unwrap();

        let doc = store.fetch_document_by_id("users", "u1").await.unwrap();
        assert_eq!(doc.unwrap().str_field("email"), Some("a@b.c"));

        let missing = store.fetch_document_by_id("users", "nope").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn filters_order_and_limit_apply() {
        let store = SqliteStore::in_memory().await.unwrap();
        for (id, status, seq) in [("e1", "active", 3), ("e2", "inactive", 1), ("e3", "active", 2)] {
            store
                .upsert_document("enrollments", id, &json!({"status": status, "seq": seq}))
                .await
                .unwrap();
        }

        let options = QueryOptions::filtered(vec![FieldFilter::eq("status", "active")])
            .with_order("seq", SortDirection::Ascending);
        let docs = store.fetch_documents("enrollments", &options).await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["e3", "e1"]);

        let limited = store
            .fetch_documents("enrollments", &QueryOptions::default().with_limit(2))
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn subcollections_are_isolated_per_parent() {
        let store = SqliteStore::in_memory().await.unwrap();
        store
            .upsert_subdocument("courses", "c1", "modules", "m1", &json!({"title": "Intro"}))
            .await
            .unwrap();
        store
            .upsert_subdocument("courses", "c2", "modules", "m1", &json!({"title": "Other"}))
            .await
            .unwrap();

        let docs = store
            .fetch_subcollection("courses", "c1", "modules", &QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].str_field("title"), Some("Intro"));
    }

    #[tokio::test]
    async fn returned_documents_are_timestamp_normalized() {
        let store = SqliteStore::in_memory().await.unwrap();
        store
            .upsert_document(
                "studentCourseSummaries",
                "s1-c1",
                &json!({"lastAccessed": {"seconds": 1_767_225_600, "nanoseconds": 0}}),
            )
            .await
            .unwrap();

        let doc = store
            .fetch_document_by_id("studentCourseSummaries", "s1-c1")
            .await
            .unwrap()
            .unwrap();
        assert!(doc.field("lastAccessed").unwrap().is_string());
        assert!(doc.timestamp_field("lastAccessed").is_some());
    }
}
