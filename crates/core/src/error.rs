//! Unified error types for hit ingestion and stats queries.
//!
//! Error codes:
//! - VALID_001: Missing or invalid required field
//! - DB_001: Failed to store a hit
//! - DB_002: Failed to read from storage

use thiserror::Error;
use validator::ValidationErrors;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Database error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorCode {
    /// DB_001: Failed to store a hit
    StoreFailed,
    /// DB_002: Failed to query hits or rollups
    QueryFailed,
}

impl DbErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StoreFailed => "DB_001",
            Self::QueryFailed => "DB_002",
        }
    }
}

/// Unified error type.
#[derive(Debug, Error)]
pub enum Error {
    /// One or more required fields are missing or invalid.
    #[error("[VALID_001] {0}")]
    Validation(String),

    /// Database error with code.
    #[error("[{code}] {message}")]
    Database { code: &'static str, message: String },

    /// A stored rollup payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),

    /// An error annotated with the operation that produced it.
    #[error("{op}: {source}")]
    Operation {
        op: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a validation error that names every offending field.
    pub fn invalid_fields(errors: &ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors.field_errors().keys().map(|k| k.to_string()).collect();
        fields.sort_unstable();
        Self::Validation(format!("invalid or missing field(s): {}", fields.join(", ")))
    }

    /// Create a database error.
    pub fn database(code: DbErrorCode, msg: impl Into<String>) -> Self {
        Self::Database {
            code: code.code(),
            message: msg.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Wrap this error with the name of the operation that failed.
    pub fn context(self, op: &'static str) -> Self {
        Self::Operation {
            op,
            source: Box::new(self),
        }
    }

    /// Unwrap operation context down to the original error.
    pub fn root(&self) -> &Error {
        match self {
            Self::Operation { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self.root(), Self::Validation(_))
    }

    /// Get the HTTP status code an upstream handler should use.
    pub fn http_status(&self) -> u16 {
        match self.root() {
            Self::Validation(_) => 400,
            Self::Serialization(_) => 400,
            _ => 500,
        }
    }

    /// Get the error code if this is a coded error.
    pub fn error_code(&self) -> Option<&'static str> {
        match self.root() {
            Self::Validation(_) => Some("VALID_001"),
            Self::Database { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_code_and_status() {
        let err = Error::database(DbErrorCode::QueryFailed, "connection reset")
            .context("list_path_stats");

        assert_eq!(err.to_string(), "list_path_stats: [DB_002] connection reset");
        assert_eq!(err.error_code(), Some("DB_002"));
        assert_eq!(err.http_status(), 500);
        assert!(!err.is_validation());
    }

    #[test]
    fn test_validation_status() {
        let err = Error::validation("invalid or missing field(s): path").context("ingest");
        assert!(err.is_validation());
        assert_eq!(err.http_status(), 400);
        assert_eq!(err.error_code(), Some("VALID_001"));
    }
}
