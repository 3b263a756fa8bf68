pub mod routes;
pub mod views;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    routing::{get, post},
    Router,
};
use lendshelf_kernel::{InitCtx, Module};
use serde_json::json;

use crate::lending::LendingService;
use crate::utils;

/// Outstanding loans and the return action
pub struct BorrowedModule {
    lending: LendingService,
}

impl BorrowedModule {
    pub fn new(lending: LendingService) -> Self {
        Self { lending }
    }
}

#[async_trait]
impl Module for BorrowedModule {
    fn name(&self) -> &'static str {
        "borrowed"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let prefix = utils::log_prefix(self.name());
        tracing::info!(
            %prefix,
            environment = ?ctx.settings.environment,
            "borrowed module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(routes::list_borrowed))
            .route("/live", get(routes::live_borrowed))
            .route("/health", get(routes::health_check))
            .route("/{book_id}/return", post(routes::return_book))
            .with_state(self.lending.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "": {
                    "get": {
                        "summary": "List borrowed books",
                        "tags": ["Borrowed"],
                        "responses": {
                            "200": {
                                "description": "Borrowed books view",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/BorrowedView" } } }
                            }
                        }
                    }
                },
                "/live": {
                    "get": {
                        "summary": "Live borrowed-book snapshots (server-sent events)",
                        "tags": ["Borrowed"],
                        "responses": {
                            "200": { "description": "Stream of `snapshot` events", "content": { "text/event-stream": {} } }
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Borrowed health check",
                        "tags": ["Borrowed"],
                        "responses": {
                            "200": { "description": "OK", "content": { "text/plain": { "schema": { "type": "string" } } } }
                        }
                    }
                },
                "/{book_id}/return": {
                    "post": {
                        "summary": "Return a borrowed book",
                        "tags": ["Borrowed"],
                        "parameters": [{ "name": "book_id", "in": "path", "required": true, "schema": { "type": "string" } }],
                        "responses": {
                            "200": {
                                "description": "Returned",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Notice" } } }
                            },
                            "404": {
                                "description": "No borrow record for the book",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } } }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "BorrowedEntry": {
                        "type": "object",
                        "properties": {
                            "record_id": { "type": "string" },
                            "book_id": { "type": "string" },
                            "name": { "type": "string" },
                            "author": { "type": "string" },
                            "cover_page": { "type": "string", "format": "uri" },
                            "borrowed_at": { "type": "string", "format": "date-time" },
                            "return_path": { "type": "string" }
                        },
                        "required": ["record_id", "book_id", "name", "author", "borrowed_at", "return_path"]
                    },
                    "BorrowedView": {
                        "type": "object",
                        "properties": {
                            "entries": { "type": "array", "items": { "$ref": "#/components/schemas/BorrowedEntry" } },
                            "empty_message": { "type": "string" }
                        },
                        "required": ["entries"]
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "borrowed module stopped");
        Ok(())
    }
}

/// Create a new instance of the borrowed module
pub fn create_module(lending: LendingService) -> Arc<dyn Module> {
    Arc::new(BorrowedModule::new(lending))
}
