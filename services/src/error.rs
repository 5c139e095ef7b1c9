use thiserror::Error;

/// Errors raised inside aggregation routines. Public entry points contain
/// these and degrade to empty results; the type mostly travels between
/// internal helpers.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] db::StoreError),

    #[error("cache serialization error: {0}")]
    Cache(#[from] serde_json::Error),
}
