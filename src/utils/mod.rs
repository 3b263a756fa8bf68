//! HTTP glue shared by the project modules.

use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive, Sse};
use lendshelf_db::StoreError;
use lendshelf_http::AppError;
use serde::Serialize;
use serde_json::json;
use tokio_stream::{Stream, StreamExt};

use crate::lending::LendingError;

/// Formats a shared log prefix for project logs.
pub fn log_prefix(module: &str) -> String {
    format!("lendshelf::{module}")
}

impl From<LendingError> for AppError {
    fn from(err: LendingError) -> Self {
        let notice = err.notice();

        let failed = matches!(
            &err,
            LendingError::Store { source, .. } if !matches!(source, StoreError::Unavailable(_))
        );
        if failed {
            return AppError::failed(notice.message, err)
                .with_code("store_failure")
                .with_title(notice.title);
        }

        let mapped = match err {
            LendingError::BookNotFound(_) => {
                AppError::not_found(notice.message.clone()).with_code("book_not_found")
            }
            LendingError::RecordNotFound(_) => {
                AppError::not_found(notice.message.clone()).with_code("record_not_found")
            }
            LendingError::LimitReached { limit, borrowed } => AppError::conflict(
                vec![json!({ "limit": limit, "borrowed": borrowed })],
                notice.message.clone(),
            )
            .with_code("limit_reached"),
            LendingError::AlreadyBorrowed(_) => {
                AppError::conflict(Vec::new(), notice.message.clone()).with_code("already_borrowed")
            }
            LendingError::Store { .. } => AppError::unavailable(notice.message.clone()),
        };
        mapped.with_title(notice.title)
    }
}

/// Payload of one live event: the full list at `version`.
#[derive(Debug, Clone, Serialize)]
pub struct LiveList<T> {
    pub version: u64,
    pub items: Vec<T>,
}

/// Wrap a stream of snapshots as server-sent `snapshot` events.
pub fn live_events<S, T>(snapshots: S) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize + 'static,
{
    let events = snapshots.map(|payload| {
        let event = Event::default()
            .event("snapshot")
            .json_data(&payload)
            .unwrap_or_else(|err| {
                tracing::error!(error = %err, "failed to encode snapshot");
                Event::default()
                    .event("error")
                    .data("snapshot encoding failed")
            });
        Ok(event)
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn limit_reached_maps_to_conflict_with_title() {
        let err: AppError = LendingError::LimitReached {
            limit: 3,
            borrowed: 3,
        }
        .into();

        match &err {
            AppError::Conflict {
                title,
                code,
                details,
                ..
            } => {
                assert_eq!(title, "Limit Reached");
                assert_eq!(code, "limit_reached");
                assert_eq!(details[0]["limit"], 3);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn not_found_variants_map_to_404() {
        let book: AppError = LendingError::BookNotFound("x".into()).into();
        let record: AppError = LendingError::RecordNotFound("x".into()).into();

        assert_eq!(book.status(), StatusCode::NOT_FOUND);
        assert_eq!(record.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_failures_keep_user_message() {
        let err: AppError = LendingError::Store {
            action: crate::lending::Action::Borrow,
            source: StoreError::NotAnObject,
        }
        .into();

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(err, AppError::Failed { .. }));
        assert_eq!(
            err.to_string(),
            "An error occurred while borrowing the book."
        );
    }

    #[test]
    fn log_prefix_is_namespaced() {
        assert_eq!(log_prefix("books"), "lendshelf::books");
    }
}
