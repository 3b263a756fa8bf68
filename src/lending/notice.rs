use serde::Serialize;

/// Blocking alert shown to the user after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new("Error", message)
    }

    pub fn borrowed() -> Self {
        Self::new("Success", "Book borrowed successfully!")
    }

    pub fn returned() -> Self {
        Self::new("Success", "Book returned successfully!")
    }

    pub fn limit_reached(limit: usize) -> Self {
        Self::new(
            "Limit Reached",
            format!("You can't borrow more than {limit} books."),
        )
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}
