//! Common error types shared by the attendance services.
//!
//! This crate provides the unified error taxonomy: validation, conflict,
//! not-found and infrastructure failures, plus the response shape handed
//! to API clients.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Database-related errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Record not found")]
    NotFound,

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}

impl DatabaseError {
    /// Whether this error is the unique-key conflict signal.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DatabaseError::DuplicateEntry(_))
    }
}

/// Error response for API clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Add details to the error response.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<DatabaseError> for ErrorResponse {
    fn from(err: DatabaseError) -> Self {
        let (code, message) = match &err {
            DatabaseError::ConnectionFailed(_) => ("DB_CONNECTION_FAILED", "Database connection failed"),
            DatabaseError::QueryFailed(_) => ("DB_QUERY_FAILED", "Database query failed"),
            DatabaseError::NotFound => ("DB_NOT_FOUND", "Record not found"),
            DatabaseError::DuplicateEntry(_) => ("DB_DUPLICATE_ENTRY", "Duplicate entry"),
            DatabaseError::TransactionFailed(_) => ("DB_TRANSACTION_FAILED", "Transaction failed"),
        };
        Self::new(code, message).with_details(err.to_string())
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Database(db) => db.into(),
            AppError::Validation(msg) => Self::new("VALIDATION_FAILED", msg),
            AppError::Conflict(msg) => Self::new("CONFLICT", msg),
            AppError::NotFound(msg) => Self::new("NOT_FOUND", msg),
            AppError::Internal(msg) => Self::new("INTERNAL_ERROR", msg),
        }
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_entry_maps_to_conflict_code() {
        let err = DatabaseError::DuplicateEntry("timesheet_closing".to_string());
        assert!(err.is_duplicate());

        let resp: ErrorResponse = err.into();
        assert_eq!(resp.code, "DB_DUPLICATE_ENTRY");
        assert!(resp.details.unwrap().contains("timesheet_closing"));
    }

    #[test]
    fn test_validation_response() {
        let resp: ErrorResponse = AppError::Validation("justification is required".into()).into();
        assert_eq!(resp.code, "VALIDATION_FAILED");
        assert_eq!(resp.message, "justification is required");
    }
}
