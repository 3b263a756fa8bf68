//! Document store client for lendshelf.
//!
//! [`DocumentStore`] is the narrow surface the application needs from a
//! managed document database. Two backends ship with the crate: a purely
//! in-memory one and one that mirrors the memory store into a JSON file.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

pub mod document;
pub mod error;
pub mod file;
pub mod memory;
pub mod store;

pub use document::{to_fields, Document, FieldFilter, Fields};
pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::DocumentStore;

/// Which backend [`open_store`] builds.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "StoreSettings::default_path")]
    pub path: PathBuf,
}

impl StoreSettings {
    fn default_path() -> PathBuf {
        PathBuf::from("data/lendshelf.json")
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: Self::default_path(),
        }
    }
}

/// Build the configured store.
pub async fn open_store(settings: &StoreSettings) -> StoreResult<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match settings.backend {
        StoreBackend::Memory => {
            tracing::info!(target: "lendshelf-db", backend = "memory", "opening document store");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::File => {
            tracing::info!(
                target: "lendshelf-db",
                backend = "file",
                path = %settings.path.display(),
                "opening document store"
            );
            Arc::new(FileStore::open(settings.path.clone()).await?)
        }
    };
    Ok(store)
}
