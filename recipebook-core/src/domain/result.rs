//! Result and error types for the core library

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::auth::AuthErrorKind;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Identity provider failure; displays the user-facing message
    #[error("{0}")]
    Auth(AuthErrorKind),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a not found error for a list position
    pub fn index_out_of_range(what: &str, index: usize, len: usize) -> Self {
        Self::NotFound(format!("{} at index {} (list has {} entries)", what, index, len))
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// The identity provider failure kind, if this is one
    pub fn auth_kind(&self) -> Option<AuthErrorKind> {
        match self {
            Self::Auth(kind) => Some(*kind),
            _ => None,
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create a failed result
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_result_ok() {
        let result: OperationResult<i32> = OperationResult::ok(42);
        assert!(result.success);
        assert_eq!(result.data, Some(42));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_operation_result_fail() {
        let result: OperationResult<i32> = OperationResult::fail("Something went wrong");
        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.error, Some("Something went wrong".to_string()));
    }

    #[test]
    fn test_from_result() {
        let err: Result<i32> = Err(Error::index_out_of_range("Recipe", 3, 1));
        let result: OperationResult<i32> = err.into();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Not found"));
    }

    #[test]
    fn test_auth_error_displays_message() {
        let err = Error::Auth(AuthErrorKind::EmailExists);
        assert_eq!(err.to_string(), "The email address is already in use by another account.");
        assert_eq!(err.auth_kind(), Some(AuthErrorKind::EmailExists));
        assert_eq!(Error::validation("x").auth_kind(), None);
    }
}
