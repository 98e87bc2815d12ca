//! Remote document store
//!
//! [`DocumentStore`] is the seam between the services and the backend.
//! [`FirestoreStore`] speaks the Firestore REST v1 wire shape;
//! [`InMemoryStore`] evaluates the same operations locally for tests and
//! offline demos.

mod firestore;
mod memory;

pub use firestore::FirestoreStore;
pub use memory::{CallCounts, InMemoryStore};

use crate::ClientResult;
use async_trait::async_trait;
use shared::document::{Document, FieldMap, StructuredQuery};

/// Collection-oriented document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in `collection`
    async fn list(&self, collection: &str) -> ClientResult<Vec<Document>>;

    /// One document by id
    async fn get(&self, collection: &str, id: &str) -> ClientResult<Document>;

    /// Create a document with a store-assigned id
    async fn create(&self, collection: &str, fields: FieldMap) -> ClientResult<Document>;

    /// Overwrite only the given fields of an existing document
    async fn patch(&self, collection: &str, id: &str, fields: FieldMap) -> ClientResult<Document>;

    /// Documents matching every filter of `query`
    async fn run_query(&self, query: &StructuredQuery) -> ClientResult<Vec<Document>>;
}
