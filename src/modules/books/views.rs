//! Render models for the catalog and detail screens.

use lendshelf_kernel::settings::DetailTheme;
use serde::Serialize;

use crate::lending::{Book, Notice};

const AVAILABLE_COLOR: &str = "#4CAF50";
const BORROWED_COLOR: &str = "#FF5C5C";

/// One row of the catalog list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_page: Option<String>,
    pub detail_path: String,
}

impl From<&Book> for CatalogEntry {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.clone(),
            name: book.name.clone(),
            author: book.author.clone(),
            cover_page: book.cover_page.clone(),
            detail_path: format!("/api/books/{}", book.id),
        }
    }
}

/// Colours a detail theme paints with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub background: [&'static str; 2],
    pub button: [&'static str; 2],
}

impl Palette {
    pub fn for_theme(theme: DetailTheme) -> Self {
        match theme {
            DetailTheme::Gradient => Self {
                background: ["#E0F7FA", "#F1F8E9"],
                button: ["#4CAF50", "#388E3C"],
            },
            DetailTheme::Plain => Self {
                background: ["#FFFFFF", "#FFFFFF"],
                button: ["#4CAF50", "#4CAF50"],
            },
        }
    }
}

/// Detail screen for one book, shared by every theme.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub book: Book,
    pub status_label: &'static str,
    pub status_color: &'static str,
    pub can_borrow: bool,
    pub theme: DetailTheme,
    pub palette: Palette,
}

impl DetailView {
    pub fn new(book: Book, theme: DetailTheme) -> Self {
        let (status_label, status_color) = if book.is_borrowed {
            ("Currently Borrowed", BORROWED_COLOR)
        } else {
            ("Available", AVAILABLE_COLOR)
        };

        Self {
            can_borrow: !book.is_borrowed,
            book,
            status_label,
            status_color,
            theme,
            palette: Palette::for_theme(theme),
        }
    }
}

/// Result of a borrow action: the alert plus the refreshed detail screen.
#[derive(Debug, Clone, Serialize)]
pub struct BorrowOutcome {
    pub notice: Notice,
    pub detail: DetailView,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(is_borrowed: bool) -> Book {
        Book {
            id: "b1".into(),
            name: "Dune".into(),
            author: "Frank Herbert".into(),
            cover_page: None,
            rating: Some(4.5),
            summary: "Spice.".into(),
            is_borrowed,
        }
    }

    #[test]
    fn available_book_can_be_borrowed() {
        let view = DetailView::new(book(false), DetailTheme::Gradient);
        assert!(view.can_borrow);
        assert_eq!(view.status_label, "Available");
        assert_eq!(view.status_color, "#4CAF50");
    }

    #[test]
    fn borrowed_book_hides_borrow_action() {
        let view = DetailView::new(book(true), DetailTheme::Plain);
        assert!(!view.can_borrow);
        assert_eq!(view.status_label, "Currently Borrowed");
        assert_eq!(view.status_color, "#FF5C5C");
    }

    #[test]
    fn theme_only_changes_palette() {
        let gradient = DetailView::new(book(false), DetailTheme::Gradient);
        let plain = DetailView::new(book(false), DetailTheme::Plain);

        assert_eq!(gradient.book, plain.book);
        assert_eq!(gradient.status_label, plain.status_label);
        assert_ne!(gradient.palette, plain.palette);
    }

    #[test]
    fn catalog_entry_links_to_detail() {
        let entry = CatalogEntry::from(&book(false));
        assert_eq!(entry.detail_path, "/api/books/b1");
    }
}
