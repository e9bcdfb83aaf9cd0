//! Application-wide error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Error classification shared by every engine error.
///
/// Module errors map themselves onto one of these kinds so callers can
/// decide between retrying, fixing input, or fixing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input (non-positive amounts, inverted date ranges).
    Validation,
    /// Lock contention or ambiguous configuration.
    Conflict,
    /// Unknown tenant, account, or rule.
    NotFound,
    /// Division by zero or an unbalanced journal entry.
    Arithmetic,
    /// A batch finished with some per-entity failures.
    PartialFailure,
    /// Store or other infrastructure failure.
    Internal,
}

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict (period already syncing, tied tax rules).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Arithmetic invariant violated.
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    /// Batch completed with per-entity failures.
    #[error("Partial failure: {0}")]
    PartialFailure(String),

    /// Store error.
    #[error("Store error: {0}")]
    Store(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds an error of the given kind.
    #[must_use]
    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Arithmetic => Self::Arithmetic(message),
            ErrorKind::PartialFailure => Self::PartialFailure(message),
            ErrorKind::Internal => Self::Internal(message),
        }
    }

    /// Returns the error classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Arithmetic(_) => ErrorKind::Arithmetic,
            Self::PartialFailure(_) => ErrorKind::PartialFailure,
            Self::Store(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Arithmetic(_) => 422,
            Self::PartialFailure(_) => 207,
            Self::Store(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Arithmetic(_) => "ARITHMETIC_ERROR",
            Self::PartialFailure(_) => "PARTIAL_FAILURE",
            Self::Store(_) => "STORE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<crate::types::MoneyError> for AppError {
    fn from(err: crate::types::MoneyError) -> Self {
        match err {
            crate::types::MoneyError::DivisionByZero { .. }
            | crate::types::MoneyError::Overflow { .. } => Self::Arithmetic(err.to_string()),
            crate::types::MoneyError::CurrencyMismatch { .. } => Self::Validation(err.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
