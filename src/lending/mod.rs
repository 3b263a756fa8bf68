//! Book lending: catalog reads, the borrow and return transitions, and live
//! views of both collections.

pub mod error;
pub mod live;
pub mod models;
pub mod notice;
pub mod service;

pub use error::{Action, LendingError, LendingResult};
pub use live::LiveView;
pub use models::{Book, BorrowRecord, BOOKS, BORROWED_BOOKS};
pub use notice::Notice;
pub use service::LendingService;
