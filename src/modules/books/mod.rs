pub mod routes;
pub mod views;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    routing::{get, post},
    Router,
};
use lendshelf_kernel::{settings::DetailTheme, InitCtx, Module};
use serde_json::json;

use crate::lending::LendingService;
use crate::utils;

/// Shared state of the catalog and detail routes.
#[derive(Clone)]
pub struct BooksState {
    pub lending: LendingService,
    pub theme: DetailTheme,
}

/// Catalog list, book detail and the borrow action
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(lending: LendingService, theme: DetailTheme) -> Self {
        Self {
            state: BooksState { lending, theme },
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let prefix = utils::log_prefix(self.name());
        tracing::info!(
            %prefix,
            environment = ?ctx.settings.environment,
            theme = ?self.state.theme,
            borrow_limit = self.state.lending.borrow_limit(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(routes::list_books))
            .route("/live", get(routes::live_books))
            .route("/health", get(routes::health_check))
            .route("/{id}", get(routes::book_detail))
            .route("/{id}/borrow", post(routes::borrow_book))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            json!({
                "description": description,
                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } } }
            })
        };
        let id_param = json!([{ "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }]);

        Some(json!({
            "paths": {
                "": {
                    "get": {
                        "summary": "List the catalog",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "Catalog entries",
                                "content": { "application/json": { "schema": {
                                    "type": "array",
                                    "items": { "$ref": "#/components/schemas/CatalogEntry" }
                                } } }
                            },
                            "500": error("Store failure")
                        }
                    }
                },
                "/live": {
                    "get": {
                        "summary": "Live catalog snapshots (server-sent events)",
                        "tags": ["Books"],
                        "responses": {
                            "200": { "description": "Stream of `snapshot` events", "content": { "text/event-stream": {} } }
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books health check",
                        "tags": ["Books"],
                        "responses": {
                            "200": { "description": "OK", "content": { "text/plain": { "schema": { "type": "string" } } } }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Book detail",
                        "tags": ["Books"],
                        "parameters": id_param.clone(),
                        "responses": {
                            "200": {
                                "description": "Detail view",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/DetailView" } } }
                            },
                            "404": error("Book details not found")
                        }
                    }
                },
                "/{id}/borrow": {
                    "post": {
                        "summary": "Borrow a book",
                        "tags": ["Books"],
                        "parameters": id_param,
                        "responses": {
                            "200": {
                                "description": "Borrowed",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/BorrowOutcome" } } }
                            },
                            "404": error("Book details not found"),
                            "409": error("Borrow limit reached or book already borrowed"),
                            "500": error("Store failure")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "name": { "type": "string" },
                            "author": { "type": "string" },
                            "coverPage": { "type": "string", "format": "uri" },
                            "rating": { "type": "number" },
                            "summary": { "type": "string" },
                            "isBorrowed": { "type": "boolean" }
                        },
                        "required": ["id", "name", "author", "summary", "isBorrowed"]
                    },
                    "CatalogEntry": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "name": { "type": "string" },
                            "author": { "type": "string" },
                            "cover_page": { "type": "string", "format": "uri" },
                            "detail_path": { "type": "string" }
                        },
                        "required": ["id", "name", "author", "detail_path"]
                    },
                    "DetailView": {
                        "type": "object",
                        "properties": {
                            "book": { "$ref": "#/components/schemas/Book" },
                            "status_label": { "type": "string" },
                            "status_color": { "type": "string" },
                            "can_borrow": { "type": "boolean" },
                            "theme": { "type": "string", "enum": ["gradient", "plain"] },
                            "palette": { "type": "object" }
                        },
                        "required": ["book", "status_label", "status_color", "can_borrow", "theme", "palette"]
                    },
                    "Notice": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "message": { "type": "string" }
                        },
                        "required": ["title", "message"]
                    },
                    "BorrowOutcome": {
                        "type": "object",
                        "properties": {
                            "notice": { "$ref": "#/components/schemas/Notice" },
                            "detail": { "$ref": "#/components/schemas/DetailView" }
                        },
                        "required": ["notice", "detail"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(lending: LendingService, theme: DetailTheme) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(lending, theme))
}
