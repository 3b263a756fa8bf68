use lendshelf_db::StoreError;
use thiserror::Error;

use super::notice::Notice;

/// User action during which a store call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Fetch,
    Borrow,
    Return,
    Seed,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Action::Fetch => "fetching",
            Action::Borrow => "borrowing",
            Action::Return => "returning",
            Action::Seed => "seeding",
        })
    }
}

#[derive(Error, Debug)]
pub enum LendingError {
    #[error("book '{0}' not found")]
    BookNotFound(String),

    #[error("no borrow record for book '{0}'")]
    RecordNotFound(String),

    #[error("borrow limit of {limit} reached ({borrowed} outstanding)")]
    LimitReached { limit: usize, borrowed: usize },

    #[error("book '{0}' is already borrowed")]
    AlreadyBorrowed(String),

    #[error("store failure while {action} a book: {source}")]
    Store {
        action: Action,
        #[source]
        source: StoreError,
    },
}

pub type LendingResult<T> = Result<T, LendingError>;

impl LendingError {
    /// Adapter for `map_err` that tags a store failure with its action.
    pub(crate) fn store(action: Action) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Store { action, source }
    }

    /// The alert a user sees for this failure.
    pub fn notice(&self) -> Notice {
        match self {
            LendingError::BookNotFound(_) => Notice::error("Book details not found."),
            LendingError::RecordNotFound(_) => {
                Notice::error("The borrowed book record does not exist.")
            }
            LendingError::LimitReached { limit, .. } => Notice::limit_reached(*limit),
            LendingError::AlreadyBorrowed(_) => {
                Notice::error("This book is currently borrowed.")
            }
            LendingError::Store { action, .. } => {
                Notice::error(format!("An error occurred while {action} the book."))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_match_alert_copy() {
        assert_eq!(
            LendingError::LimitReached {
                limit: 3,
                borrowed: 3
            }
            .notice(),
            Notice::new("Limit Reached", "You can't borrow more than 3 books.")
        );
        assert_eq!(
            LendingError::BookNotFound("b1".into()).notice().message,
            "Book details not found."
        );
        assert_eq!(
            LendingError::store(Action::Return)(StoreError::Unavailable("offline".into()))
                .notice()
                .message,
            "An error occurred while returning the book."
        );
    }
}
