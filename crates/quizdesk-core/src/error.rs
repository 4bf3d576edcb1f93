//! Error types for the quizdesk core crate.
//!
//! This module defines the error hierarchy for configuration loading, input
//! validation performed before any request is sent, token storage, and
//! general I/O.

use std::path::PathBuf;

/// A specialized `Result` type for quizdesk core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in the client-side console logic.
///
/// Validation variants correspond to inline, non-blocking warnings: the
/// operation simply does not proceed and nothing is sent to the backend.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your quizdesk.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Input Validation Errors
    // ========================================================================
    /// User input was rejected before any request was made.
    #[error("{field}: {message}")]
    Validation {
        /// The form field or subject the message refers to.
        field: String,
        /// Localized message shown to the administrator.
        message: String,
    },

    /// A referenced topic is not present in the loaded catalog.
    #[error("Topic {id} is not in the loaded catalog\n\nSuggestion: Reload the topic list")]
    TopicNotFound {
        /// Topic id that was looked up.
        id: u64,
    },

    /// A referenced volume is neither fetched nor pending.
    #[error("Volume '{name}' does not exist\n\nSuggestion: Create the volume first")]
    VolumeNotFound {
        /// Volume name that was looked up.
        name: String,
    },

    // ========================================================================
    // Upload Errors
    // ========================================================================
    /// A file chosen for upload has the wrong kind.
    #[error("File '{path}' is not a {expected} file")]
    UnsupportedUpload {
        /// Path to the rejected file.
        path: PathBuf,
        /// Human-readable expected kind (e.g. "PNG").
        expected: String,
    },

    // ========================================================================
    // Token Storage Errors
    // ========================================================================
    /// Failed to read or write the persisted bearer token.
    #[error("Token storage error at '{path}': {message}\n\nSuggestion: Check permissions or run 'quizdesk login' again")]
    TokenStorage {
        /// Path to the token file.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new input `Validation` error.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a new `UnsupportedUpload` error.
    #[must_use]
    pub fn unsupported_upload(path: impl Into<PathBuf>, expected: impl Into<String>) -> Self {
        Self::UnsupportedUpload {
            path: path.into(),
            expected: expected.into(),
        }
    }

    /// Creates a new `TokenStorage` error.
    #[must_use]
    pub fn token_storage(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::TokenStorage {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this error was raised before any request was made
    /// because the administrator's input was rejected.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::TopicNotFound { .. }
                | Self::VolumeNotFound { .. }
                | Self::UnsupportedUpload { .. }
        )
    }

    /// Returns the localized message without the field prefix, when this is
    /// an input validation error.
    #[must_use]
    pub fn validation_message(&self) -> Option<&str> {
        match self {
            Self::Validation { message, .. } => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = CoreError::config_parse("/etc/quizdesk.json", "expected value");
        let msg = err.to_string();
        assert!(msg.contains("Invalid JSON"));
        assert!(msg.contains("/etc/quizdesk.json"));
        assert!(msg.contains("Suggestion"));
    }

    #[test]
    fn test_validation_display_includes_field() {
        let err = CoreError::validation("hard_tags", "Введите минимум 2 тега");
        assert_eq!(err.to_string(), "hard_tags: Введите минимум 2 тега");
        assert_eq!(err.validation_message(), Some("Введите минимум 2 тега"));
    }

    #[test]
    fn test_is_validation() {
        assert!(CoreError::validation("name", "empty").is_validation());
        assert!(CoreError::TopicNotFound { id: 3 }.is_validation());
        assert!(CoreError::unsupported_upload("/tmp/a.jpg", "PNG").is_validation());
        assert!(!CoreError::config_validation("bad", "fix").is_validation());
        assert!(!CoreError::token_storage("/tmp/token", "denied").is_validation());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CoreError = io_err.into();
        assert!(matches!(err, CoreError::Io(_)));
        assert!(err.validation_message().is_none());
    }
}
