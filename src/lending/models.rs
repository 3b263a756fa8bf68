use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Catalog collection.
pub const BOOKS: &str = "books";
/// One document per outstanding loan.
pub const BORROWED_BOOKS: &str = "borrowedBooks";

pub const IS_BORROWED_FIELD: &str = "isBorrowed";
pub const BOOK_ID_FIELD: &str = "bookId";

/// A catalog entry. `is_borrowed` is the only availability signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub is_borrowed: bool,
}

/// Denormalized copy of a book taken at borrow time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRecord {
    /// Store-assigned; empty until the record has been inserted.
    pub id: String,
    pub book_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub summary: String,
    #[serde(with = "time::serde::rfc3339")]
    pub borrowed_at: OffsetDateTime,
}

impl BorrowRecord {
    pub fn for_book(book: &Book, borrowed_at: OffsetDateTime) -> Self {
        Self {
            id: String::new(),
            book_id: book.id.clone(),
            name: book.name.clone(),
            author: book.author.clone(),
            cover_page: book.cover_page.clone(),
            rating: book.rating,
            summary: book.summary.clone(),
            borrowed_at,
        }
    }
}
