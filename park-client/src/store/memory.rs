//! In-memory document store with failure injection

use super::DocumentStore;
use crate::{ClientError, ClientResult};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use shared::document::{Document, FieldMap, StructuredQuery};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

/// Number of calls seen per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list: usize,
    pub get: usize,
    pub create: usize,
    pub patch: usize,
    pub query: usize,
}

#[derive(Default)]
struct Counters {
    list: AtomicUsize,
    get: AtomicUsize,
    create: AtomicUsize,
    patch: AtomicUsize,
    query: AtomicUsize,
}

/// Document store held in process memory
///
/// Queries are evaluated with the same filter semantics as the remote store.
#[derive(Default)]
pub struct InMemoryStore {
    collections: Mutex<HashMap<String, BTreeMap<String, Document>>>,
    offline: AtomicBool,
    fail_queries: AtomicBool,
    fail_creates: AtomicBool,
    failing_patches: Mutex<HashSet<String>>,
    counters: Counters,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document under a known id
    pub fn insert(&self, collection: &str, id: &str, fields: FieldMap) -> Document {
        let mut doc = Document::new(format!("memory/{}/{}", collection, id), fields);
        doc.create_time = Some(Utc::now());
        doc.update_time = doc.create_time;
        self.collections
            .lock()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc.clone());
        doc
    }

    /// Snapshot of a collection ordered by id
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .lock()
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Every operation fails with [`ClientError::Offline`]
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    /// Patches of this document id fail until cleared
    pub fn fail_patches_for(&self, id: &str) {
        self.failing_patches.lock().insert(id.to_string());
    }

    pub fn clear_failures(&self) {
        self.offline.store(false, Ordering::SeqCst);
        self.fail_queries.store(false, Ordering::SeqCst);
        self.fail_creates.store(false, Ordering::SeqCst);
        self.failing_patches.lock().clear();
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            list: self.counters.list.load(Ordering::SeqCst),
            get: self.counters.get.load(Ordering::SeqCst),
            create: self.counters.create.load(Ordering::SeqCst),
            patch: self.counters.patch.load(Ordering::SeqCst),
            query: self.counters.query.load(Ordering::SeqCst),
        }
    }

    fn check_online(&self) -> ClientResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(ClientError::Offline)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn list(&self, collection: &str) -> ClientResult<Vec<Document>> {
        self.counters.list.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        Ok(self.documents(collection))
    }

    async fn get(&self, collection: &str, id: &str) -> ClientResult<Document> {
        self.counters.get.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.collections
            .lock()
            .get(collection)
            .and_then(|docs| docs.get(id).cloned())
            .ok_or_else(|| ClientError::NotFound(format!("{}/{}", collection, id)))
    }

    async fn create(&self, collection: &str, fields: FieldMap) -> ClientResult<Document> {
        self.counters.create.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 500,
                body: "injected create failure".into(),
            });
        }
        let id = Uuid::new_v4().simple().to_string();
        Ok(self.insert(collection, &id, fields))
    }

    async fn patch(&self, collection: &str, id: &str, fields: FieldMap) -> ClientResult<Document> {
        self.counters.patch.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        if self.failing_patches.lock().contains(id) {
            return Err(ClientError::Status {
                status: 503,
                body: format!("injected patch failure for {}", id),
            });
        }

        let mut collections = self.collections.lock();
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| ClientError::NotFound(format!("{}/{}", collection, id)))?;
        doc.fields.extend(fields);
        doc.update_time = Some(Utc::now());
        Ok(doc.clone())
    }

    async fn run_query(&self, query: &StructuredQuery) -> ClientResult<Vec<Document>> {
        self.counters.query.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 500,
                body: "injected query failure".into(),
            });
        }
        Ok(self
            .documents(&query.collection)
            .into_iter()
            .filter(|doc| query.matches(doc))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::document::field;

    #[tokio::test]
    async fn test_create_patch_and_query() {
        let store = InMemoryStore::new();
        let created = store
            .create("parkingLots", FieldMap::from([field("availableSpots", 5i64)]))
            .await
            .unwrap();
        let id = created.id().to_string();

        store
            .patch("parkingLots", &id, FieldMap::from([field("availableSpots", 2i64)]))
            .await
            .unwrap();
        let doc = store.get("parkingLots", &id).await.unwrap();
        assert_eq!(doc.integer("availableSpots").unwrap(), 2);

        let query = StructuredQuery::collection("parkingLots").where_lt("availableSpots", 3i64);
        assert_eq!(store.run_query(&query).await.unwrap().len(), 1);
        assert_eq!(store.calls().query, 1);
    }

    #[tokio::test]
    async fn test_patch_missing_document() {
        let store = InMemoryStore::new();
        let err = store
            .patch("parkingLots", "nope", FieldMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = InMemoryStore::new();
        store.insert("parkingLots", "a", FieldMap::new());

        store.set_offline(true);
        assert!(matches!(
            store.list("parkingLots").await,
            Err(ClientError::Offline)
        ));

        store.clear_failures();
        store.fail_patches_for("a");
        assert!(store.patch("parkingLots", "a", FieldMap::new()).await.is_err());
        assert_eq!(store.calls().patch, 1);
        assert_eq!(store.calls().list, 1);
    }
}
