//! Error types for gramdex.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GramdexError>;

/// The main error type.
#[derive(Error, Debug)]
pub enum GramdexError {
    /// I/O failure (config files, external stores).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Caller supplied an unusable argument, e.g. an empty document id.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration failed validation.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Malformed query syntax.
    #[error("Query error: {0}")]
    Query(String),

    /// Persisted bytes could not be decoded. Indicates upstream misuse of an
    /// encoder or a damaged store, never a user error.
    #[error("Corrupted data: {0}")]
    Corruption(String),

    /// The ordered key-value store rejected an operation.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A document or bucket does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(String),
}

impl GramdexError {
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        GramdexError::InvalidArgument(msg.into())
    }

    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        GramdexError::InvalidConfig(msg.into())
    }

    pub fn query<S: Into<String>>(msg: S) -> Self {
        GramdexError::Query(msg.into())
    }

    pub fn corruption<S: Into<String>>(msg: S) -> Self {
        GramdexError::Corruption(msg.into())
    }

    pub fn storage<S: Into<String>>(msg: S) -> Self {
        GramdexError::Storage(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        GramdexError::NotFound(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        GramdexError::Internal(msg.into())
    }

    pub fn other<S: Into<String>>(msg: S) -> Self {
        GramdexError::Other(msg.into())
    }

    /// Whether this error reports damaged persisted data.
    pub fn is_corruption(&self) -> bool {
        matches!(self, GramdexError::Corruption(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_and_display() {
        let err = GramdexError::invalid_argument("empty document id");
        assert_eq!(err.to_string(), "Invalid argument: empty document id");

        let err = GramdexError::corruption("truncated block");
        assert!(err.is_corruption());
        assert_eq!(err.to_string(), "Corrupted data: truncated block");

        let err = GramdexError::query("multiple | groups");
        assert!(!err.is_corruption());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: GramdexError = io.into();
        assert!(matches!(err, GramdexError::Io(_)));
    }
}
