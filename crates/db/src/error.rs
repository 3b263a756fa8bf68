//! Error types for document store access

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures surfaced by a [`crate::DocumentStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document '{id}' not found in collection '{collection}'")]
    NotFound { collection: String, id: String },

    #[error("record must serialize to a JSON object")]
    NotAnObject,

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }
}
