//! Proration error types.

use chrono::{DateTime, Utc};
use ledgerline_shared::types::MoneyError;
use ledgerline_shared::{AppError, ErrorKind};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the proration calculator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProrationError {
    /// A price was negative.
    #[error("{field} cannot be negative, got {amount}")]
    NegativePrice {
        /// Which input.
        field: &'static str,
        /// Rejected amount.
        amount: Decimal,
    },

    /// The billing cycle has no length.
    #[error(transparent)]
    Arithmetic(#[from] MoneyError),

    /// Change or cancellation date outside the billing cycle.
    #[error("{date} is outside the billing cycle {start} to {end}")]
    InvalidDateRange {
        /// Rejected date.
        date: DateTime<Utc>,
        /// Cycle start.
        start: DateTime<Utc>,
        /// Cycle end.
        end: DateTime<Utc>,
    },
}

impl ProrationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NegativePrice { .. } => "NEGATIVE_PRICE",
            Self::Arithmetic(_) => "DIVISION_BY_ZERO",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
        }
    }

    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NegativePrice { .. } | Self::InvalidDateRange { .. } => ErrorKind::Validation,
            Self::Arithmetic(_) => ErrorKind::Arithmetic,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NegativePrice { .. } | Self::InvalidDateRange { .. } => 400,
            Self::Arithmetic(_) => 422,
        }
    }

    /// Proration inputs never become valid by retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }
}

impl From<ProrationError> for AppError {
    fn from(err: ProrationError) -> Self {
        Self::from_kind(err.kind(), err.to_string())
    }
}
