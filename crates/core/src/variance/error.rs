//! Variance error types.

use ledgerline_shared::types::TenantId;
use ledgerline_shared::{AppError, ErrorKind};
use thiserror::Error;

use crate::store::StoreError;

/// Errors that abort a variance computation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VarianceError {
    /// Year or month does not name a calendar month.
    #[error("Invalid period: {year}-{month:02}")]
    InvalidPeriod {
        /// Year.
        year: i32,
        /// Month.
        month: u32,
    },

    /// Tenant does not exist.
    #[error("Tenant not found: {0}")]
    TenantNotFound(TenantId),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl VarianceError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPeriod { .. } => "INVALID_PERIOD",
            Self::TenantNotFound(_) => "TENANT_NOT_FOUND",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPeriod { .. } => ErrorKind::Validation,
            Self::TenantNotFound(_) => ErrorKind::NotFound,
            Self::Store(err) => err.kind(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidPeriod { .. } => 400,
            Self::TenantNotFound(_) => 404,
            Self::Store(err) => err.http_status_code(),
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_retryable())
    }
}

impl From<VarianceError> for AppError {
    fn from(err: VarianceError) -> Self {
        match err {
            VarianceError::Store(store) => store.into(),
            other => Self::from_kind(other.kind(), other.to_string()),
        }
    }
}
