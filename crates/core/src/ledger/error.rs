//! Ledger error types for validation, sync and store errors.

use chrono::NaiveDate;
use ledgerline_shared::types::{SourceId, TenantId};
use ledgerline_shared::{AppError, ErrorKind};
use rust_decimal::Decimal;
use thiserror::Error;

use super::source::SourceType;
use crate::store::StoreError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Entry Construction Errors ==========
    /// Journal entry must have at least 2 lines.
    #[error("Journal entry must have at least 2 lines")]
    InsufficientLines,

    /// Journal entry is not balanced (debits != credits).
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedEntry {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// Line amounts add up beyond what a `Decimal` can hold.
    #[error("Amount overflow while computing {0}")]
    AmountOverflow(&'static str),

    /// Line amount cannot be negative.
    #[error("Line amount cannot be negative")]
    NegativeAmount,

    /// Line must carry exactly one of debit or credit.
    #[error("Line must specify either debit or credit, not both or neither")]
    InvalidLine,

    // ========== Account Errors ==========
    /// No account with the given code in the tenant's chart.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Account is inactive and cannot be posted to.
    #[error("Account {0} is inactive")]
    AccountInactive(String),

    // ========== Request Errors ==========
    /// Year/month does not name a calendar month.
    #[error("Invalid period {year}-{month:02}")]
    InvalidPeriod {
        /// Requested year.
        year: i32,
        /// Requested month.
        month: u32,
    },

    /// Date range is inverted or leaves the requested month.
    #[error("Invalid date range {start} to {end}")]
    InvalidDateRange {
        /// Range start.
        start: NaiveDate,
        /// Range end.
        end: NaiveDate,
    },

    /// Tenant does not exist.
    #[error("Tenant not found: {0}")]
    TenantNotFound(TenantId),

    /// Source transaction is not in a postable state.
    #[error("{source_type} {source_id} is not in a postable state")]
    NotPostable {
        /// Source type.
        source_type: SourceType,
        /// Source ID.
        source_id: SourceId,
    },

    // ========== Period Errors ==========
    /// Period is closed, no posting allowed.
    #[error("Period {0} is closed, no posting allowed")]
    PeriodClosed(String),

    /// Another sync holds the period.
    #[error("Period {0} is already syncing")]
    SyncInProgress(String),

    // ========== Store Errors ==========
    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines => "INSUFFICIENT_LINES",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::AmountOverflow(_) => "AMOUNT_OVERFLOW",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::InvalidLine => "INVALID_LINE",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::InvalidPeriod { .. } => "INVALID_PERIOD",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::TenantNotFound(_) => "TENANT_NOT_FOUND",
            Self::NotPostable { .. } => "NOT_POSTABLE",
            Self::PeriodClosed(_) => "PERIOD_CLOSED",
            Self::SyncInProgress(_) => "SYNC_IN_PROGRESS",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientLines
            | Self::NegativeAmount
            | Self::InvalidLine
            | Self::AccountInactive(_)
            | Self::InvalidPeriod { .. }
            | Self::InvalidDateRange { .. }
            | Self::NotPostable { .. } => ErrorKind::Validation,
            Self::UnbalancedEntry { .. } | Self::AmountOverflow(_) => ErrorKind::Arithmetic,
            Self::AccountNotFound(_) | Self::TenantNotFound(_) => ErrorKind::NotFound,
            Self::PeriodClosed(_) | Self::SyncInProgress(_) => ErrorKind::Conflict,
            Self::Store(err) => err.kind(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::InsufficientLines
            | Self::NegativeAmount
            | Self::InvalidLine
            | Self::AccountInactive(_)
            | Self::InvalidPeriod { .. }
            | Self::InvalidDateRange { .. }
            | Self::NotPostable { .. } => 400,

            // 404 Not Found
            Self::AccountNotFound(_) | Self::TenantNotFound(_) => 404,

            // 409 Conflict - period state
            Self::PeriodClosed(_) | Self::SyncInProgress(_) => 409,

            // 422 Unprocessable - arithmetic invariant
            Self::UnbalancedEntry { .. } | Self::AmountOverflow(_) => 422,

            Self::Store(err) => err.http_status_code(),
        }
    }

    /// Returns true if the caller may retry the same call later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::SyncInProgress(_) => true,
            Self::Store(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Store(store) => store.into(),
            other => Self::from_kind(other.kind(), other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::InsufficientLines.error_code(), "INSUFFICIENT_LINES");
        assert_eq!(
            LedgerError::UnbalancedEntry {
                debit: Decimal::new(100, 2),
                credit: Decimal::new(50, 2),
            }
            .error_code(),
            "UNBALANCED_ENTRY"
        );
        assert_eq!(
            LedgerError::SyncInProgress("2024-03".into()).error_code(),
            "SYNC_IN_PROGRESS"
        );
    }

    #[test]
    fn test_kinds_follow_error_model() {
        assert_eq!(
            LedgerError::UnbalancedEntry {
                debit: Decimal::ONE,
                credit: Decimal::ZERO,
            }
            .kind(),
            ErrorKind::Arithmetic
        );
        assert_eq!(
            LedgerError::AmountOverflow("entry debits").kind(),
            ErrorKind::Arithmetic
        );
        assert_eq!(
            LedgerError::SyncInProgress("2024-03".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            LedgerError::PeriodClosed("2024-03".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            LedgerError::TenantNotFound(TenantId::new()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            LedgerError::InvalidPeriod { year: 2024, month: 13 }.kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            LedgerError::Store(StoreError::Backend("down".into())).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::InsufficientLines.http_status_code(), 400);
        assert_eq!(LedgerError::AccountNotFound("101".into()).http_status_code(), 404);
        assert_eq!(LedgerError::SyncInProgress("2024-03".into()).http_status_code(), 409);
        assert_eq!(
            LedgerError::Store(StoreError::Backend("down".into())).http_status_code(),
            500
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(LedgerError::SyncInProgress("2024-03".into()).is_retryable());
        assert!(LedgerError::Store(StoreError::Backend("timeout".into())).is_retryable());
        assert!(!LedgerError::PeriodClosed("2024-03".into()).is_retryable());
        assert!(!LedgerError::NegativeAmount.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::UnbalancedEntry {
            debit: Decimal::new(1_180_000, 2),
            credit: Decimal::new(1_100_000, 2),
        };
        assert_eq!(
            err.to_string(),
            "Journal entry is not balanced. Debit: 11800.00, Credit: 11000.00"
        );
        assert_eq!(
            LedgerError::InvalidPeriod { year: 2024, month: 13 }.to_string(),
            "Invalid period 2024-13"
        );
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = LedgerError::SyncInProgress("2024-03".into()).into();
        assert_eq!(app.kind(), ErrorKind::Conflict);
        assert_eq!(app.to_string(), "Conflict: Period 2024-03 is already syncing");

        let app: AppError = LedgerError::Store(StoreError::Backend("down".into())).into();
        assert_eq!(app.error_code(), "STORE_ERROR");
    }
}
