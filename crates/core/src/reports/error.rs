//! Report error types.

use chrono::NaiveDate;
use ledgerline_shared::types::TenantId;
use ledgerline_shared::{AppError, ErrorKind};
use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur during report generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// Invalid date range.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// A window or horizon of zero days.
    #[error("{0} must be at least one day")]
    EmptyWindow(&'static str),

    /// Forecast horizon beyond [`super::MAX_FORECAST_DAYS`].
    #[error("Forecast horizon of {requested} days exceeds the {max}-day limit")]
    HorizonTooLong {
        /// Requested days.
        requested: u32,
        /// Accepted maximum.
        max: u32,
    },

    /// Tenant does not exist.
    #[error("Tenant not found: {0}")]
    TenantNotFound(TenantId),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReportError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::EmptyWindow(_) => "EMPTY_WINDOW",
            Self::HorizonTooLong { .. } => "HORIZON_TOO_LONG",
            Self::TenantNotFound(_) => "TENANT_NOT_FOUND",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDateRange { .. } | Self::EmptyWindow(_) | Self::HorizonTooLong { .. } => {
                ErrorKind::Validation
            }
            Self::TenantNotFound(_) => ErrorKind::NotFound,
            Self::Store(err) => err.kind(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidDateRange { .. } | Self::EmptyWindow(_) | Self::HorizonTooLong { .. } => 400,
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

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::Store(store) => store.into(),
            other => Self::from_kind(other.kind(), other.to_string()),
        }
    }
}
