use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use lendshelf_http::AppError;
use tokio_stream::StreamExt;

use super::views::{BorrowedEntry, BorrowedView};
use crate::lending::{LendingService, Notice};
use crate::utils::{live_events, LiveList};

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "borrowed module is healthy"
}

pub async fn list_borrowed(
    State(lending): State<LendingService>,
) -> Result<Json<BorrowedView>, AppError> {
    let records = lending.list_borrowed().await?;
    Ok(Json(BorrowedView::new(&records)))
}

pub async fn live_borrowed(
    State(lending): State<LendingService>,
) -> Result<impl IntoResponse, AppError> {
    let view = lending.watch_borrowed().await?;
    let lists = view.into_stream().map(|snapshot| LiveList {
        version: snapshot.version,
        items: snapshot
            .items
            .iter()
            .map(BorrowedEntry::from)
            .collect::<Vec<_>>(),
    });
    Ok(live_events(lists))
}

pub async fn return_book(
    State(lending): State<LendingService>,
    Path(book_id): Path<String>,
) -> Result<Json<Notice>, AppError> {
    lending.return_book(&book_id).await?;
    Ok(Json(Notice::returned()))
}
