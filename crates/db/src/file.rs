//! JSON-file backed document store.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use lendshelf_events::Subscription;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::document::{Document, FieldFilter, Fields};
use crate::error::StoreResult;
use crate::memory::MemoryStore;
use crate::store::DocumentStore;

#[derive(Debug, Default, Serialize, Deserialize)]
struct FileImage {
    #[serde(default)]
    collections: BTreeMap<String, Vec<Document>>,
}

/// A [`MemoryStore`] whose whole content is rewritten to disk after every
/// successful mutation.
///
/// A failed write is reported but the in-memory change is kept, so memory
/// and disk disagree until the next successful write or a restart.
pub struct FileStore {
    inner: MemoryStore,
    path: PathBuf,
    write_guard: Mutex<()>,
}

impl FileStore {
    /// Load the store from `path`. A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        let image = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<FileImage>(&bytes)?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "store file absent, starting empty");
                FileImage::default()
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!(
            path = %path.display(),
            collections = image.collections.len(),
            "file store opened"
        );

        Ok(Self {
            inner: MemoryStore::from_documents(image.collections),
            path,
            write_guard: Mutex::new(()),
        })
    }

    async fn persist(&self) -> StoreResult<()> {
        let _guard = self.write_guard.lock().await;

        let image = FileImage {
            collections: self.inner.export().await,
        };
        let bytes = serde_json::to_vec_pretty(&image)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, bytes).await?;

        tracing::trace!(path = %self.path.display(), "store file written");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.inner.get_document(collection, id).await
    }

    async fn list_documents(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.inner.list_documents(collection).await
    }

    async fn query_documents(
        &self,
        collection: &str,
        filter: &FieldFilter,
    ) -> StoreResult<Vec<Document>> {
        self.inner.query_documents(collection, filter).await
    }

    async fn insert_document(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        let id = self.inner.insert_document(collection, fields).await?;
        self.persist().await?;
        Ok(id)
    }

    async fn set_document(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        self.inner.set_document(collection, id, fields).await?;
        self.persist().await
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> StoreResult<()> {
        self.inner.update_document(collection, id, fields).await?;
        self.persist().await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.inner.delete_document(collection, id).await?;
        self.persist().await
    }

    async fn subscribe(&self, collection: &str) -> StoreResult<Subscription<Document>> {
        self.inner.subscribe(collection).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::to_fields;
    use serde_json::json;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("lendshelf-db-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let store = FileStore::open(scratch_path("store.json")).await.unwrap();
        assert!(store.list_documents("books").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn writes_survive_reopen() {
        let path = scratch_path("store.json");

        let store = FileStore::open(&path).await.unwrap();
        store
            .set_document("books", "b1", to_fields(&json!({"name": "Emma"})).unwrap())
            .await
            .unwrap();
        let record = store
            .insert_document("borrowedBooks", to_fields(&json!({"bookId": "b1"})).unwrap())
            .await
            .unwrap();
        drop(store);

        let reopened = FileStore::open(&path).await.unwrap();
        let book = reopened.get_document("books", "b1").await.unwrap().unwrap();
        assert_eq!(book.get("name"), Some(&json!("Emma")));
        assert!(reopened
            .get_document("borrowedBooks", &record)
            .await
            .unwrap()
            .is_some());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn failed_write_keeps_change_in_memory() {
        let path = scratch_path("store.json");
        let store = FileStore::open(&path).await.unwrap();
        // A directory in place of the file makes every write fail.
        std::fs::create_dir_all(&path).unwrap();

        let err = store
            .set_document("books", "b1", to_fields(&json!({"name": "Emma"})).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, crate::StoreError::Io(_)));
        assert!(store.get_document("books", "b1").await.unwrap().is_some());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serialization_error() {
        let path = scratch_path("store.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"not json").unwrap();

        let err = FileStore::open(&path).await.err().unwrap();
        assert!(matches!(err, crate::StoreError::Serialization(_)));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
