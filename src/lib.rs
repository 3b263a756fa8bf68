//! lendshelf application library
//!
//! Book catalog, borrowing with a fixed limit on outstanding loans, returns,
//! and live views of both, over a managed document store.

pub mod app;
pub mod lending;
pub mod modules;
pub mod utils;

pub use app::App;
pub use lending::{Book, BorrowRecord, LendingError, LendingService, Notice};
