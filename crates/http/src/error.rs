//! Error handling for the lendshelf HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

const DEFAULT_TITLE: &str = "Error";

/// Application error types that map to HTTP responses.
///
/// Every variant carries the alert `title` a client shows to the user next
/// to `message`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("conflict: {message}")]
    Conflict {
        details: Vec<serde_json::Value>,
        code: String,
        title: String,
        message: String,
    },

    #[error("not found: {message}")]
    NotFound {
        message: String,
        code: String,
        title: String,
    },

    #[error("bad request: {message}")]
    BadRequest {
        message: String,
        code: String,
        title: String,
    },

    #[error("service unavailable: {message}")]
    Unavailable {
        message: String,
        code: String,
        title: String,
    },

    /// A server-side failure whose `message` is safe to show the user.
    #[error("{message}")]
    Failed {
        message: String,
        code: String,
        title: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a conflict error
    pub fn conflict(details: Vec<serde_json::Value>, message: impl Into<String>) -> Self {
        Self::Conflict {
            details,
            code: "conflict".to_string(),
            title: DEFAULT_TITLE.to_string(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: "not_found".to_string(),
            title: DEFAULT_TITLE.to_string(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            code: "bad_request".to_string(),
            title: DEFAULT_TITLE.to_string(),
        }
    }

    /// Create a service unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            code: "unavailable".to_string(),
            title: DEFAULT_TITLE.to_string(),
        }
    }

    /// Create a server failure that keeps `message` in the response body
    pub fn failed(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Failed {
            message: message.into(),
            code: "internal_error".to_string(),
            title: DEFAULT_TITLE.to_string(),
            source: source.into(),
        }
    }

    /// Replace the machine-readable code
    pub fn with_code(mut self, new_code: impl Into<String>) -> Self {
        match &mut self {
            AppError::Conflict { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::BadRequest { code, .. }
            | AppError::Unavailable { code, .. }
            | AppError::Failed { code, .. } => *code = new_code.into(),
            AppError::Internal(_) => {}
        }
        self
    }

    /// Replace the alert title
    pub fn with_title(mut self, new_title: impl Into<String>) -> Self {
        match &mut self {
            AppError::Conflict { title, .. }
            | AppError::NotFound { title, .. }
            | AppError::BadRequest { title, .. }
            | AppError::Unavailable { title, .. }
            | AppError::Failed { title, .. } => *title = new_title.into(),
            AppError::Internal(_) => {}
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Failed { .. } | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        let status = self.status();

        let masked = matches!(self, AppError::Internal(_)) && cfg!(not(debug_assertions));

        let (error_code, title, message, details) = match self {
            AppError::Conflict {
                details,
                code,
                title,
                message,
            } => (code, title, message, Some(details)),
            AppError::NotFound {
                message,
                code,
                title,
            }
            | AppError::BadRequest {
                message,
                code,
                title,
            }
            | AppError::Unavailable {
                message,
                code,
                title,
            } => (code, title, message, None),
            AppError::Failed {
                message,
                code,
                title,
                source,
            } => {
                tracing::error!(error_id = %error_id, error = ?source, "request failed");
                (code, title, message, None)
            }
            AppError::Internal(e) => {
                tracing::error!(error_id = %error_id, error = ?e, "internal error");
                (
                    "internal_error".to_string(),
                    DEFAULT_TITLE.to_string(),
                    e.to_string(),
                    None,
                )
            }
        };

        tracing::error!(
            error_id = %error_id,
            error_code = %error_code,
            status_code = %status.as_u16(),
            "Request error"
        );

        // Release builds hide unexpected error details
        let message = if masked {
            "An internal server error occurred".to_string()
        } else {
            message
        };

        let error_response = json!({
            "error": {
                "code": error_code,
                "title": title,
                "message": message,
                "details": details.unwrap_or_default(),
                "trace_id": error_id.to_string(),
                "timestamp": timestamp
            }
        });

        (status, Json(error_response)).into_response()
    }
}
