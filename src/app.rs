//! Application bootstrap: store, lending service and module registry.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use lendshelf_db::{open_store, DocumentStore};
use lendshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::lending::LendingService;
use crate::modules;

pub struct App {
    pub settings: Settings,
    pub lending: LendingService,
    pub registry: ModuleRegistry,
}

impl App {
    /// Open the configured store and wire every module.
    pub async fn build(settings: Settings) -> anyhow::Result<Self> {
        let store = open_store(&settings.store)
            .await
            .context("failed to open document store")?;
        Self::with_store(settings, store)
    }

    pub fn with_store(settings: Settings, store: Arc<dyn DocumentStore>) -> anyhow::Result<Self> {
        let lending = LendingService::new(store, settings.lending.borrow_limit);

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &lending, &settings)
            .context("failed to register modules")?;

        Ok(Self {
            settings,
            lending,
            registry,
        })
    }

    pub fn router(&self) -> Router {
        lendshelf_http::build_router(&self.registry, &self.settings)
    }

    /// Run the module lifecycle around the HTTP server.
    pub async fn serve(&self) -> anyhow::Result<()> {
        let ctx = InitCtx {
            settings: &self.settings,
        };

        self.registry.init_modules(&ctx).await?;
        self.registry.start_modules(&ctx).await?;

        let served = lendshelf_http::start_server(&self.registry, &self.settings).await;

        self.registry.stop_modules().await?;
        served
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lending::Book;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use lendshelf_db::{Document, FieldFilter, Fields, MemoryStore, StoreError, StoreResult};
    use lendshelf_events::Subscription;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn app_with_books(ids: &[&str]) -> App {
        let app = App::with_store(Settings::default(), Arc::new(MemoryStore::new())).unwrap();
        let books: Vec<Book> = ids
            .iter()
            .map(|id| Book {
                id: id.to_string(),
                name: format!("Book {id}"),
                author: "Anon".to_string(),
                cover_page: None,
                rating: Some(3.5),
                summary: String::new(),
                is_borrowed: false,
            })
            .collect();
        app.lending.seed_books(&books).await.unwrap();
        app
    }

    async fn call(app: &App, method: &str, uri: &str) -> (StatusCode, Value) {
        let response = app
            .router()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn registers_both_modules() {
        let app = app_with_books(&[]).await;
        assert!(app.registry.get_module("books").is_some());
        assert!(app.registry.get_module("borrowed").is_some());
    }

    #[tokio::test]
    async fn catalog_lists_books_with_detail_links() {
        let app = app_with_books(&["a", "b", "c"]).await;

        let (status, body) = call(&app, "GET", "/api/books").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
        assert_eq!(body[0]["detail_path"], "/api/books/a");
    }

    #[tokio::test]
    async fn borrow_and_return_over_http() {
        let app = app_with_books(&["a", "b", "c"]).await;

        let (status, body) = call(&app, "POST", "/api/books/a/borrow").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["notice"]["message"], "Book borrowed successfully!");
        assert_eq!(body["detail"]["book"]["isBorrowed"], true);
        assert_eq!(body["detail"]["can_borrow"], false);

        let (_, borrowed) = call(&app, "GET", "/api/borrowed").await;
        assert_eq!(borrowed["entries"].as_array().unwrap().len(), 1);
        assert_eq!(borrowed["entries"][0]["book_id"], "a");

        let (status, body) = call(&app, "POST", "/api/borrowed/a/return").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Book returned successfully!");

        let (_, borrowed) = call(&app, "GET", "/api/borrowed").await;
        assert!(borrowed["entries"].as_array().unwrap().is_empty());
        assert_eq!(borrowed["empty_message"], "You haven't borrowed any books yet.");

        let (_, detail) = call(&app, "GET", "/api/books/a").await;
        assert_eq!(detail["status_label"], "Available");
    }

    #[tokio::test]
    async fn fourth_borrow_is_rejected() {
        let app = app_with_books(&["a", "b", "c", "d"]).await;
        for id in ["a", "b", "c"] {
            let (status, _) = call(&app, "POST", &format!("/api/books/{id}/borrow")).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = call(&app, "POST", "/api/books/d/borrow").await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "limit_reached");
        assert_eq!(body["error"]["title"], "Limit Reached");
        assert_eq!(app.lending.list_borrowed().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn borrowing_a_borrowed_book_conflicts() {
        let app = app_with_books(&["a"]).await;
        call(&app, "POST", "/api/books/a/borrow").await;

        let (status, body) = call(&app, "POST", "/api/books/a/borrow").await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "already_borrowed");
        assert_eq!(app.lending.list_borrowed().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_book_and_missing_record_are_404() {
        let app = app_with_books(&["a"]).await;

        let (status, body) = call(&app, "GET", "/api/books/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Book details not found.");

        let (status, body) = call(&app, "POST", "/api/borrowed/a/return").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "record_not_found");
    }

    #[tokio::test]
    async fn health_and_openapi_are_served() {
        let app = app_with_books(&[]).await;

        let (status, _) = call(&app, "GET", "/healthz").await;
        assert_eq!(status, StatusCode::OK);

        let (status, doc) = call(&app, "GET", "/docs/openapi.json").await;
        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"]["/api/books/{id}/borrow"].is_object());
        assert!(doc["paths"]["/api/borrowed/{book_id}/return"].is_object());
    }

    /// Memory store that cannot write borrow records.
    struct ReadOnlyLoans {
        inner: MemoryStore,
    }

    #[async_trait]
    impl DocumentStore for ReadOnlyLoans {
        async fn get_document(&self, c: &str, id: &str) -> StoreResult<Option<Document>> {
            self.inner.get_document(c, id).await
        }

        async fn list_documents(&self, c: &str) -> StoreResult<Vec<Document>> {
            self.inner.list_documents(c).await
        }

        async fn query_documents(&self, c: &str, f: &FieldFilter) -> StoreResult<Vec<Document>> {
            self.inner.query_documents(c, f).await
        }

        async fn insert_document(&self, _c: &str, _fields: Fields) -> StoreResult<String> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }

        async fn set_document(&self, c: &str, id: &str, fields: Fields) -> StoreResult<()> {
            self.inner.set_document(c, id, fields).await
        }

        async fn update_document(&self, c: &str, id: &str, fields: Fields) -> StoreResult<()> {
            self.inner.update_document(c, id, fields).await
        }

        async fn delete_document(&self, c: &str, id: &str) -> StoreResult<()> {
            self.inner.delete_document(c, id).await
        }

        async fn subscribe(&self, c: &str) -> StoreResult<Subscription<Document>> {
            self.inner.subscribe(c).await
        }
    }

    #[tokio::test]
    async fn store_failure_keeps_borrow_alert_text() {
        let store = Arc::new(ReadOnlyLoans {
            inner: MemoryStore::new(),
        });
        let app = App::with_store(Settings::default(), store).unwrap();
        app.lending
            .seed_books(&[Book {
                id: "a".to_string(),
                name: "Book a".to_string(),
                author: "Anon".to_string(),
                cover_page: None,
                rating: None,
                summary: String::new(),
                is_borrowed: false,
            }])
            .await
            .unwrap();

        let (status, body) = call(&app, "POST", "/api/books/a/borrow").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "store_failure");
        assert_eq!(
            body["error"]["message"],
            "An error occurred while borrowing the book."
        );
        assert!(!app.lending.fetch_book("a").await.unwrap().is_borrowed);
    }

    #[tokio::test]
    async fn live_catalog_streams_server_sent_events() {
        let app = app_with_books(&["a"]).await;

        let response = app
            .router()
            .oneshot(
                Request::get("/api/books/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "text/event-stream"
        );
    }
}
