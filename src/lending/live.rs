use std::marker::PhantomData;

use lendshelf_db::Document;
use lendshelf_events::{Snapshot, Subscription};
use serde::de::DeserializeOwned;
use tokio_stream::{Stream, StreamExt};

/// Typed live view over one collection: every store snapshot is decoded in
/// full and replaces the previous list.
pub struct LiveView<T> {
    subscription: Subscription<Document>,
    _record: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> LiveView<T> {
    pub(crate) fn new(subscription: Subscription<Document>) -> Self {
        Self {
            subscription,
            _record: PhantomData,
        }
    }

    /// Current state first, then one item per change. `None` once the
    /// store is gone.
    pub async fn next(&mut self) -> Option<Snapshot<T>> {
        self.subscription.next().await.map(decode_snapshot)
    }
}

impl<T> LiveView<T>
where
    T: DeserializeOwned + Send + 'static,
{
    pub fn into_stream(self) -> impl Stream<Item = Snapshot<T>> + Send + 'static {
        self.subscription.into_stream().map(decode_snapshot::<T>)
    }
}

/// Decode every document, skipping the ones that do not fit `T`.
pub(crate) fn decode_documents<T: DeserializeOwned>(
    collection: &str,
    documents: &[Document],
) -> Vec<T> {
    documents
        .iter()
        .filter_map(|doc| match doc.decode::<T>() {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(
                    collection,
                    id = %doc.id,
                    error = %err,
                    "skipping undecodable document"
                );
                None
            }
        })
        .collect()
}

fn decode_snapshot<T: DeserializeOwned>(snapshot: Snapshot<Document>) -> Snapshot<T> {
    let items = decode_documents(&snapshot.collection, &snapshot.items);
    Snapshot {
        collection: snapshot.collection,
        version: snapshot.version,
        items,
    }
}
