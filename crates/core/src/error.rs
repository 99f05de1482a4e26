//! Error types for precis operations.
//!
//! This module defines the main error type [`PrecisError`] which represents
//! every failure the library can surface: extraction outcomes that the caller
//! is expected to render (no container, text too short), transform failures
//! propagated from the summarizer, and storage or I/O problems.
//!
//! # Example
//!
//! ```rust
//! use precis_core::{PrecisError, Result};
//!
//! fn require_text(text: &str, min_length: usize) -> Result<&str> {
//!     let actual_length = text.chars().count();
//!     if actual_length < min_length {
//!         return Err(PrecisError::ArticleTooShort { actual_length, min_length });
//!     }
//!     Ok(text)
//! }
//! # assert!(require_text("short", 100).is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::digest::TransformError;

/// Main error type for extraction, caching and digest operations.
///
/// The extraction variants ([`PrecisError::NoContainer`], [`PrecisError::NoText`],
/// [`PrecisError::ArticleTooShort`], [`PrecisError::SelectionTooShort`]) are
/// expected outcomes rather than faults; use [`PrecisError::code`] to get the
/// stable tag for each.
///
/// # Example
///
/// ```rust
/// use precis_core::PrecisError;
///
/// let err = PrecisError::ArticleTooShort { actual_length: 42, min_length: 200 };
/// assert_eq!(err.code(), "article_too_short");
/// match err {
///     PrecisError::ArticleTooShort { actual_length, min_length } => {
///         println!("Only {} of {} characters", actual_length, min_length);
///     }
///     other => println!("Error: {}", other),
/// }
/// ```
#[derive(Error, Debug)]
pub enum PrecisError {
    /// No configured content query matched anything in the document.
    #[error("No content container found in the document")]
    NoContainer,

    /// A container was found but yielded no text after cleaning.
    #[error("The content container has no text")]
    NoText,

    /// The extracted article text is shorter than the configured minimum.
    #[error("Article text too short ({actual_length} characters, minimum {min_length})")]
    ArticleTooShort { actual_length: usize, min_length: usize },

    /// The user selection is shorter than the configured minimum.
    #[error("Selected text too short ({actual_length} characters, minimum {min_length})")]
    SelectionTooShort { actual_length: usize, min_length: usize },

    /// The external transformation failed.
    ///
    /// The inner error is the classification made by the transform capability
    /// and is propagated unmodified.
    #[error("Transform failed: {0}")]
    Transform(#[from] TransformError),

    /// The persistence backend failed to read, write or delete a value.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid configuration values.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid CSS selector or unparsable markup.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// HTTP request errors from reqwest.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Standard I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PrecisError {
    /// Stable tag identifying the kind of failure.
    pub fn code(&self) -> &'static str {
        match self {
            PrecisError::NoContainer => "no_container",
            PrecisError::NoText => "no_text",
            PrecisError::ArticleTooShort { .. } => "article_too_short",
            PrecisError::SelectionTooShort { .. } => "selection_too_short",
            PrecisError::Transform(err) => err.code(),
            PrecisError::Storage(_) => "storage",
            PrecisError::ConfigError(_) => "config",
            PrecisError::HtmlParseError(_) => "html_parse",
            #[cfg(feature = "fetch")]
            PrecisError::HttpError(_) => "http",
            PrecisError::Timeout { .. } => "timeout",
            PrecisError::InvalidUrl(_) => "invalid_url",
            PrecisError::FileNotFound(_) => "file_not_found",
            PrecisError::Io(_) => "io",
        }
    }

    /// Whether this error is one of the extraction outcomes a caller should
    /// render to the user rather than treat as a fault.
    pub fn is_extraction_outcome(&self) -> bool {
        matches!(
            self,
            PrecisError::NoContainer
                | PrecisError::NoText
                | PrecisError::ArticleTooShort { .. }
                | PrecisError::SelectionTooShort { .. }
        )
    }
}

/// Result type alias for PrecisError.
pub type Result<T> = std::result::Result<T, PrecisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PrecisError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_too_short_carries_lengths() {
        let err = PrecisError::ArticleTooShort { actual_length: 15, min_length: 200 };
        assert!(err.to_string().contains("15"));
        assert!(err.to_string().contains("200"));

        let err = PrecisError::SelectionTooShort { actual_length: 3, min_length: 50 };
        assert_eq!(err.code(), "selection_too_short");
        assert!(err.to_string().contains("50"));
    }

    #[test]
    fn test_codes() {
        assert_eq!(PrecisError::NoContainer.code(), "no_container");
        assert_eq!(PrecisError::NoText.code(), "no_text");
        assert_eq!(PrecisError::Timeout { timeout: 30 }.code(), "timeout");
        assert_eq!(PrecisError::from(TransformError::RateLimited { retry_after: None }).code(), "rate_limited");
    }

    #[test]
    fn test_extraction_outcomes() {
        assert!(PrecisError::NoContainer.is_extraction_outcome());
        assert!(PrecisError::ArticleTooShort { actual_length: 1, min_length: 2 }.is_extraction_outcome());
        assert!(!PrecisError::Storage("disk full".to_string()).is_extraction_outcome());
    }
}
