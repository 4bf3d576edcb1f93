//! quizdesk REST client
//!
//! Async client for the tutoring platform backend plus the multi-step admin
//! workflows built on it.
//!
//! Every workflow validates input first, sends the request, and applies the
//! local mutation only after the backend confirmed it.

use quizdesk_core::CoreError;
use thiserror::Error;

pub mod api;
pub mod backup;
pub mod pool;
pub mod resources;
pub mod workflows;

pub use api::{error_detail, ApiClient};
pub use workflows::Console;

/// A specialized `Result` type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while talking to the backend.
#[derive(Debug, Error)]
pub enum ClientError {
    // ========================================================================
    // Request Failures
    // ========================================================================
    /// The backend answered with a non-success status.
    #[error("{detail}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Server-provided detail, or a localized fallback.
        detail: String,
    },

    /// No token is stored, or the backend rejected it.
    #[error("Authentication required\n\nSuggestion: Run 'quizdesk login'")]
    Unauthorized,

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    // ========================================================================
    // Local Failures
    // ========================================================================
    /// Input was rejected before any request was sent.
    #[error(transparent)]
    Validation(#[from] CoreError),

    /// Reading or writing a local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err)
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl ClientError {
    /// Creates an `Http` error.
    #[must_use]
    pub fn http(status: u16, detail: impl Into<String>) -> Self {
        Self::Http {
            status,
            detail: detail.into(),
        }
    }

    /// Returns `true` if the session must re-authenticate.
    ///
    /// This is the only error that is fatal to a session.
    #[must_use]
    pub const fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Returns `true` if no request was sent because input was rejected.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(e) if e.is_validation())
    }

    /// HTTP status for `Http` errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
