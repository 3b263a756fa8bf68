use async_trait::async_trait;
use lendshelf_events::Subscription;

use crate::document::{Document, FieldFilter, Fields};
use crate::error::StoreResult;

/// Client interface of the managed document database.
///
/// Collections spring into existence on first write and reading an unknown
/// collection yields nothing. Every mutation pushes a full snapshot of the
/// touched collection to its subscribers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document, `None` when it does not exist.
    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    async fn list_documents(&self, collection: &str) -> StoreResult<Vec<Document>>;

    async fn query_documents(
        &self,
        collection: &str,
        filter: &FieldFilter,
    ) -> StoreResult<Vec<Document>>;

    /// Insert under a store-assigned id and return that id.
    async fn insert_document(&self, collection: &str, fields: Fields) -> StoreResult<String>;

    /// Create or overwrite a document under a caller-chosen id.
    async fn set_document(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()>;

    /// Merge `fields` into an existing document. Fails with
    /// [`crate::StoreError::NotFound`] when the document is absent.
    async fn update_document(&self, collection: &str, id: &str, fields: Fields)
        -> StoreResult<()>;

    /// Remove a document. Deleting an absent document succeeds.
    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Open a live subscription on `collection`.
    async fn subscribe(&self, collection: &str) -> StoreResult<Subscription<Document>>;
}
