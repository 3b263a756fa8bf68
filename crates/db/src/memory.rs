//! In-process document store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use lendshelf_events::{SnapshotHub, Subscription};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::document::{Document, FieldFilter, Fields};
use crate::error::{StoreError, StoreResult};
use crate::store::DocumentStore;

type Collection = BTreeMap<String, Fields>;

/// Collection name to documents, each collection ordered by document id.
pub type Collections = BTreeMap<String, Collection>;

/// Document store held entirely in memory.
///
/// Snapshots are published while the write lock is held, so subscribers
/// observe mutations in commit order.
pub struct MemoryStore {
    collections: RwLock<Collections>,
    hub: SnapshotHub<Document>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_collections(Collections::new())
    }

    pub fn with_collections(collections: Collections) -> Self {
        Self {
            collections: RwLock::new(collections),
            hub: SnapshotHub::new(),
        }
    }

    /// Build a store pre-populated with `documents` per collection.
    pub fn from_documents(documents: BTreeMap<String, Vec<Document>>) -> Self {
        let collections = documents
            .into_iter()
            .map(|(name, docs)| {
                let collection = docs.into_iter().map(|doc| (doc.id, doc.fields)).collect();
                (name, collection)
            })
            .collect();
        Self::with_collections(collections)
    }

    /// Copy out every collection.
    pub async fn export(&self) -> BTreeMap<String, Vec<Document>> {
        let collections = self.collections.read().await;
        collections
            .keys()
            .map(|name| (name.clone(), documents_of(&collections, name)))
            .collect()
    }

    /// Live subscriber count for `collection`.
    pub fn subscriber_count(&self, collection: &str) -> usize {
        self.hub.subscriber_count(collection)
    }

    fn publish(&self, collections: &Collections, collection: &str) {
        self.hub
            .publish(collection, documents_of(collections, collection));
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn documents_of(collections: &Collections, collection: &str) -> Vec<Document> {
    collections
        .get(collection)
        .map(|docs| {
            docs.iter()
                .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn list_documents(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(documents_of(&collections, collection))
    }

    async fn query_documents(
        &self,
        collection: &str,
        filter: &FieldFilter,
    ) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, fields)| filter.matches(fields))
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert_document(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        let id = Uuid::now_v7().to_string();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        self.publish(&collections, collection);

        tracing::debug!(collection, id = %id, "document inserted");
        Ok(id)
    }

    async fn set_document(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        self.publish(&collections, collection);

        tracing::debug!(collection, id, "document set");
        Ok(())
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        existing.extend(fields);
        self.publish(&collections, collection);

        tracing::debug!(collection, id, "document updated");
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let removed = collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some();

        if removed {
            self.publish(&collections, collection);
            tracing::debug!(collection, id, "document deleted");
        }
        Ok(())
    }

    async fn subscribe(&self, collection: &str) -> StoreResult<Subscription<Document>> {
        let collections = self.collections.read().await;
        Ok(self
            .hub
            .subscribe(collection, || documents_of(&collections, collection)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::to_fields;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        to_fields(&value).unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_distinct_ids() {
        let store = MemoryStore::new();
        let a = store
            .insert_document("borrowedBooks", fields(json!({"bookId": "b1"})))
            .await
            .unwrap();
        let b = store
            .insert_document("borrowedBooks", fields(json!({"bookId": "b1"})))
            .await
            .unwrap();

        assert_ne!(a, b);
        assert_eq!(store.list_documents("borrowedBooks").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn get_missing_document_is_none() {
        let store = MemoryStore::new();
        assert!(store.get_document("books", "nope").await.unwrap().is_none());
        assert!(store.list_documents("books").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let store = MemoryStore::new();
        store
            .set_document("books", "b1", fields(json!({"name": "Dune", "isBorrowed": false})))
            .await
            .unwrap();

        store
            .update_document("books", "b1", fields(json!({"isBorrowed": true})))
            .await
            .unwrap();

        let doc = store.get_document("books", "b1").await.unwrap().unwrap();
        assert_eq!(doc.get("name"), Some(&json!("Dune")));
        assert_eq!(doc.get("isBorrowed"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn update_missing_document_fails() {
        let store = MemoryStore::new();
        let err = store
            .update_document("books", "ghost", fields(json!({"isBorrowed": true})))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::NotFound { ref id, .. } if id == "ghost"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        store
            .set_document("books", "b1", fields(json!({"name": "Emma"})))
            .await
            .unwrap();

        store.delete_document("books", "b1").await.unwrap();
        store.delete_document("books", "b1").await.unwrap();
        assert!(store.get_document("books", "b1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn query_filters_by_field() {
        let store = MemoryStore::new();
        for book in ["b1", "b2", "b1"] {
            store
                .insert_document("borrowedBooks", fields(json!({"bookId": book})))
                .await
                .unwrap();
        }

        let hits = store
            .query_documents("borrowedBooks", &FieldFilter::equals("bookId", "b1"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|doc| doc.get("bookId") == Some(&json!("b1"))));
    }

    #[tokio::test]
    async fn subscription_receives_full_snapshots() {
        let store = MemoryStore::new();
        store
            .set_document("books", "b1", fields(json!({"name": "Emma"})))
            .await
            .unwrap();

        let mut sub = store.subscribe("books").await.unwrap();
        assert_eq!(sub.next().await.unwrap().len(), 1);

        store
            .set_document("books", "b2", fields(json!({"name": "Persuasion"})))
            .await
            .unwrap();

        let snapshot = sub.next().await.unwrap();
        let ids: Vec<_> = snapshot.items.iter().map(|doc| doc.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "b2"]);
    }

    #[tokio::test]
    async fn writes_to_other_collections_do_not_notify() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe("books").await.unwrap();
        sub.next().await.unwrap();

        store
            .insert_document("borrowedBooks", fields(json!({"bookId": "b1"})))
            .await
            .unwrap();

        let pending =
            tokio::time::timeout(std::time::Duration::from_millis(20), sub.next()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn export_round_trips_through_from_documents() {
        let store = MemoryStore::new();
        store
            .set_document("books", "b1", fields(json!({"name": "Emma"})))
            .await
            .unwrap();

        let copy = MemoryStore::from_documents(store.export().await);
        let doc = copy.get_document("books", "b1").await.unwrap().unwrap();
        assert_eq!(doc.get("name"), Some(&json!("Emma")));
    }
}
