//! Borrow and return transitions over the document store.
//!
//! Each transition is a plain sequence of store calls. Nothing is wrapped in
//! a transaction and nothing is rolled back: a failure part-way through
//! leaves whatever already committed in place, and two concurrent borrows
//! can both pass the limit check. Partial commits are logged at `error`.

use std::sync::Arc;

use lendshelf_db::{to_fields, DocumentStore, FieldFilter, Fields};
use serde_json::Value;
use time::OffsetDateTime;

use super::error::{Action, LendingError, LendingResult};
use super::live::{decode_documents, LiveView};
use super::models::{
    Book, BorrowRecord, BOOKS, BOOK_ID_FIELD, BORROWED_BOOKS, IS_BORROWED_FIELD,
};

pub struct LendingService<S: ?Sized = dyn DocumentStore> {
    store: Arc<S>,
    borrow_limit: usize,
}

impl<S: ?Sized> Clone for LendingService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            borrow_limit: self.borrow_limit,
        }
    }
}

fn availability(is_borrowed: bool) -> Fields {
    let mut fields = Fields::new();
    fields.insert(IS_BORROWED_FIELD.to_string(), Value::Bool(is_borrowed));
    fields
}

impl<S: DocumentStore + ?Sized> LendingService<S> {
    pub fn new(store: Arc<S>, borrow_limit: usize) -> Self {
        Self {
            store,
            borrow_limit,
        }
    }

    pub fn borrow_limit(&self) -> usize {
        self.borrow_limit
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// One-shot read of the catalog.
    pub async fn list_books(&self) -> LendingResult<Vec<Book>> {
        let documents = self
            .store
            .list_documents(BOOKS)
            .await
            .map_err(LendingError::store(Action::Fetch))?;
        Ok(decode_documents(BOOKS, &documents))
    }

    /// Load a single book for the detail view.
    pub async fn fetch_book(&self, book_id: &str) -> LendingResult<Book> {
        let document = self
            .store
            .get_document(BOOKS, book_id)
            .await
            .map_err(LendingError::store(Action::Fetch))?
            .ok_or_else(|| LendingError::BookNotFound(book_id.to_string()))?;

        document.decode().map_err(LendingError::store(Action::Fetch))
    }

    /// One-shot read of outstanding loans.
    pub async fn list_borrowed(&self) -> LendingResult<Vec<BorrowRecord>> {
        let documents = self
            .store
            .list_documents(BORROWED_BOOKS)
            .await
            .map_err(LendingError::store(Action::Fetch))?;
        Ok(decode_documents(BORROWED_BOOKS, &documents))
    }

    /// Borrow `book` as the caller last saw it.
    ///
    /// Counts outstanding loans, inserts a borrow record, then flips the
    /// book's flag. Returns the caller's copy with the flag set. The book is
    /// not re-read from the store, so retrying with a stale copy after a
    /// failed flag update inserts a second record for the same book.
    ///
    /// The count and the insert are separate calls, so two concurrent
    /// borrows can both pass the check and exceed the limit.
    pub async fn borrow(&self, book: &Book) -> LendingResult<Book> {
        if book.is_borrowed {
            return Err(LendingError::AlreadyBorrowed(book.id.clone()));
        }

        let outstanding = self
            .store
            .list_documents(BORROWED_BOOKS)
            .await
            .map_err(LendingError::store(Action::Borrow))?
            .len();

        if outstanding >= self.borrow_limit {
            tracing::warn!(
                book_id = %book.id,
                outstanding,
                limit = self.borrow_limit,
                "borrow rejected, limit reached"
            );
            return Err(LendingError::LimitReached {
                limit: self.borrow_limit,
                borrowed: outstanding,
            });
        }

        let record = BorrowRecord::for_book(book, OffsetDateTime::now_utc());
        let fields = to_fields(&record).map_err(LendingError::store(Action::Borrow))?;
        let record_id = self
            .store
            .insert_document(BORROWED_BOOKS, fields)
            .await
            .map_err(LendingError::store(Action::Borrow))?;
        tracing::debug!(book_id = %book.id, record_id = %record_id, "borrow record inserted");

        if let Err(source) = self
            .store
            .update_document(BOOKS, &book.id, availability(true))
            .await
        {
            tracing::error!(
                book_id = %book.id,
                record_id = %record_id,
                error = %source,
                "borrow record written but availability flag not set"
            );
            return Err(LendingError::Store {
                action: Action::Borrow,
                source,
            });
        }

        tracing::info!(book_id = %book.id, record_id = %record_id, "book borrowed");

        Ok(Book {
            is_borrowed: true,
            ..book.clone()
        })
    }

    /// Return the book with id `book_id`.
    ///
    /// Deletes the first borrow record referencing the book, then clears the
    /// book's flag. Extra records for the same book are left untouched.
    pub async fn return_book(&self, book_id: &str) -> LendingResult<()> {
        let matches = self
            .store
            .query_documents(BORROWED_BOOKS, &FieldFilter::equals(BOOK_ID_FIELD, book_id))
            .await
            .map_err(LendingError::store(Action::Return))?;

        let Some(record) = matches.first() else {
            tracing::warn!(book_id, "no borrow record to return");
            return Err(LendingError::RecordNotFound(book_id.to_string()));
        };

        if matches.len() > 1 {
            tracing::warn!(
                book_id,
                records = matches.len(),
                "several borrow records for one book, removing only the first"
            );
        }

        self.store
            .delete_document(BORROWED_BOOKS, &record.id)
            .await
            .map_err(LendingError::store(Action::Return))?;
        tracing::debug!(book_id, record_id = %record.id, "borrow record deleted");

        if let Err(source) = self
            .store
            .update_document(BOOKS, book_id, availability(false))
            .await
        {
            tracing::error!(
                book_id,
                record_id = %record.id,
                error = %source,
                "borrow record deleted but availability flag not cleared"
            );
            return Err(LendingError::Store {
                action: Action::Return,
                source,
            });
        }

        tracing::info!(book_id, record_id = %record.id, "book returned");
        Ok(())
    }

    /// Write catalog entries under their own ids, replacing existing ones.
    pub async fn seed_books(&self, books: &[Book]) -> LendingResult<usize> {
        for book in books {
            let fields = to_fields(book).map_err(LendingError::store(Action::Seed))?;
            self.store
                .set_document(BOOKS, &book.id, fields)
                .await
                .map_err(LendingError::store(Action::Seed))?;
        }
        tracing::info!(count = books.len(), "catalog seeded");
        Ok(books.len())
    }

    /// Standing subscription on the catalog.
    pub async fn watch_catalog(&self) -> LendingResult<LiveView<Book>> {
        let subscription = self
            .store
            .subscribe(BOOKS)
            .await
            .map_err(LendingError::store(Action::Fetch))?;
        Ok(LiveView::new(subscription))
    }

    /// Standing subscription on outstanding loans.
    pub async fn watch_borrowed(&self) -> LendingResult<LiveView<BorrowRecord>> {
        let subscription = self
            .store
            .subscribe(BORROWED_BOOKS)
            .await
            .map_err(LendingError::store(Action::Fetch))?;
        Ok(LiveView::new(subscription))
    }
}
