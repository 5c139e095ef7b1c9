//! Document Access Layer.
//!
//! Wraps the backing document store behind the [`store::DocumentStore`]
//! trait: generic fetch-by-collection, fetch-by-id and fetch-subcollection
//! with filter/order/limit options. Every document returned by a store
//! implementation has had its timestamps normalized (see [`timestamp`]),
//! so structured timestamp objects never leak past this layer.
//!
//! Errors bubble out of this crate untouched; deciding whether a failed
//! fetch degrades to an empty dashboard is the caller's job.

pub mod collections;
pub mod error;
pub mod filters;
pub mod models;
pub mod sqlite;
pub mod store;
pub mod test_utils;
pub mod timestamp;

pub use error::StoreError;
pub use sqlite::SqliteStore;
pub use store::{Document, DocumentStore};
