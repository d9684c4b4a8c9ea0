//! Error types for SoulSeed.
//!
//! Library crates use [`SoulseedError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics, and the HTTP
//! layer maps it onto JSON error bodies.

use std::path::PathBuf;

/// Top-level error type for all SoulSeed operations.
#[derive(Debug, thiserror::Error)]
pub enum SoulseedError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error talking to the model provider or a name source.
    #[error("network error: {0}")]
    Network(String),

    /// JSON/HTML parsing or content extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Model provider returned an error or an unusable response.
    #[error("llm error: {0}")]
    Llm(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (missing fields, bad parameters).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// HTML-to-Markdown conversion error.
    #[error("conversion error: {0}")]
    Conversion(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SoulseedError>;

impl SoulseedError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for SoulseedError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(err.to_string())
    }
}
