//! Error types for wikipage operations.
//!
//! This module defines the main error type [`WikiError`] which represents
//! all possible errors that can occur while building requests, talking to
//! the Wikipedia and Wikidata APIs, and decoding their responses.
//!
//! # Example
//!
//! ```rust
//! use wikipage_core::{WikiError, Result};
//!
//! fn require_title(title: Option<&str>) -> Result<&str> {
//!     title.ok_or(WikiError::MissingIdentifier { operation: "get_rest", needs: "a title" })
//! }
//! # assert!(require_title(None).is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

#[cfg(feature = "infobox")]
use sxd_xpath::ExecutionError;

/// Main error type for wikipage operations.
///
/// Malformed API responses are not represented here: a page whose response
/// cannot be decoded is marked fatal and logged instead.
#[derive(Error, Debug)]
pub enum WikiError {
    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, connection issues,
    /// and other HTTP-related problems.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    ///
    /// Returned when an HTTP request exceeds the configured timeout duration.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL, either built from bad input or given as a proxy.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// JSON (de)serialization failure outside of API response handling.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The API reported the page or entity as missing.
    ///
    /// Carries the request URL (without the `format` parameter) so the
    /// lookup can be reproduced by hand.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An operation was called without the identifier it requires.
    #[error("{operation} needs {needs}")]
    MissingIdentifier { operation: &'static str, needs: &'static str },

    /// A bulk API document did not have the expected shape.
    #[error("Unable to parse result: {0}")]
    UnexpectedShape(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File read and write errors.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Parse-tree XML or XPath errors.
    ///
    /// This variant is only available when the `infobox` feature is enabled.
    #[cfg(feature = "infobox")]
    #[error("Parse tree error: {0}")]
    ParseTreeError(String),
}

#[cfg(feature = "infobox")]
impl From<ExecutionError> for WikiError {
    fn from(err: ExecutionError) -> Self {
        WikiError::ParseTreeError(err.to_string())
    }
}

/// Result type alias for WikiError.
///
/// This is a convenience alias for `std::result::Result<T, WikiError>`.
pub type Result<T> = std::result::Result<T, WikiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WikiError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_missing_identifier_error() {
        let err = WikiError::MissingIdentifier { operation: "get_parse", needs: "title or pageid" };
        assert_eq!(err.to_string(), "get_parse needs title or pageid");
    }

    #[test]
    fn test_timeout_error() {
        let err = WikiError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
    }

    #[test]
    fn test_not_found_error() {
        let err = WikiError::NotFound("https://en.wikipedia.org/w/api.php?action=query".to_string());
        assert!(err.to_string().starts_with("Not found:"));
    }
}
