use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use lendshelf_http::AppError;
use tokio_stream::StreamExt;

use super::views::{BorrowOutcome, CatalogEntry, DetailView};
use super::BooksState;
use crate::lending::Notice;
use crate::utils::{live_events, LiveList};

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "books module is healthy"
}

pub async fn list_books(
    State(state): State<BooksState>,
) -> Result<Json<Vec<CatalogEntry>>, AppError> {
    let books = state.lending.list_books().await?;
    Ok(Json(books.iter().map(CatalogEntry::from).collect()))
}

/// Catalog snapshots as server-sent events; the subscription ends when the
/// client disconnects.
pub async fn live_books(State(state): State<BooksState>) -> Result<impl IntoResponse, AppError> {
    let view = state.lending.watch_catalog().await?;
    let lists = view.into_stream().map(|snapshot| LiveList {
        version: snapshot.version,
        items: snapshot
            .items
            .iter()
            .map(CatalogEntry::from)
            .collect::<Vec<_>>(),
    });
    Ok(live_events(lists))
}

pub async fn book_detail(
    State(state): State<BooksState>,
    Path(id): Path<String>,
) -> Result<Json<DetailView>, AppError> {
    let book = state.lending.fetch_book(&id).await?;
    Ok(Json(DetailView::new(book, state.theme)))
}

/// Detail-screen borrow: load the book, then run the borrow transition on
/// that copy.
pub async fn borrow_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
) -> Result<Json<BorrowOutcome>, AppError> {
    let book = state.lending.fetch_book(&id).await?;
    let updated = state.lending.borrow(&book).await?;

    Ok(Json(BorrowOutcome {
        notice: Notice::borrowed(),
        detail: DetailView::new(updated, state.theme),
    }))
}
