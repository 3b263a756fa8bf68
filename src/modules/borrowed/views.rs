use serde::Serialize;
use time::format_description::well_known::Rfc3339;

use crate::lending::BorrowRecord;

pub const EMPTY_MESSAGE: &str = "You haven't borrowed any books yet.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BorrowedEntry {
    pub record_id: String,
    pub book_id: String,
    pub name: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_page: Option<String>,
    pub borrowed_at: String,
    pub return_path: String,
}

impl From<&BorrowRecord> for BorrowedEntry {
    fn from(record: &BorrowRecord) -> Self {
        Self {
            record_id: record.id.clone(),
            book_id: record.book_id.clone(),
            name: record.name.clone(),
            author: record.author.clone(),
            cover_page: record.cover_page.clone(),
            borrowed_at: record.borrowed_at.format(&Rfc3339).unwrap_or_default(),
            return_path: format!("/api/borrowed/{}/return", record.book_id),
        }
    }
}

/// The borrowed-books screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BorrowedView {
    pub entries: Vec<BorrowedEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<&'static str>,
}

impl BorrowedView {
    pub fn new(records: &[BorrowRecord]) -> Self {
        Self {
            entries: records.iter().map(BorrowedEntry::from).collect(),
            empty_message: records.is_empty().then_some(EMPTY_MESSAGE),
        }
    }
}
