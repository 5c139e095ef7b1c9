use thiserror::Error;

/// Errors surfaced by the document access layer.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("malformed document {collection}/{id}: {source}")]
    MalformedDocument {
        collection: String,
        id: String,
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
