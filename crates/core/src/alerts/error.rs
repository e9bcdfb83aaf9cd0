//! Alert error types.

use ledgerline_shared::types::{AlertRuleId, TenantId};
use ledgerline_shared::{AppError, ErrorKind};
use thiserror::Error;

use crate::store::StoreError;

/// Errors raised while evaluating alerts.
///
/// Rule-level variants are collected per rule; only `TenantNotFound` and
/// store errors while loading the tenant's data abort a check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlertError {
    /// The stored rule cannot be turned into a condition.
    #[error("Alert rule {rule_id} is invalid: {reason}")]
    InvalidRule {
        /// Rule.
        rule_id: AlertRuleId,
        /// Why.
        reason: String,
    },

    /// The data the rule watches is unavailable.
    #[error("Alert rule {rule_id} has no data: {reason}")]
    MissingData {
        /// Rule.
        rule_id: AlertRuleId,
        /// What is missing.
        reason: String,
    },

    /// Tenant does not exist.
    #[error("Tenant not found: {0}")]
    TenantNotFound(TenantId),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AlertError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRule { .. } => "INVALID_ALERT_RULE",
            Self::MissingData { .. } => "ALERT_DATA_MISSING",
            Self::TenantNotFound(_) => "TENANT_NOT_FOUND",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRule { .. } => ErrorKind::Validation,
            Self::MissingData { .. } | Self::TenantNotFound(_) => ErrorKind::NotFound,
            Self::Store(err) => err.kind(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidRule { .. } => 400,
            Self::MissingData { .. } | Self::TenantNotFound(_) => 404,
            Self::Store(err) => err.http_status_code(),
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_retryable())
    }
}

impl From<AlertError> for AppError {
    fn from(err: AlertError) -> Self {
        match err {
            AlertError::Store(store) => store.into(),
            other => Self::from_kind(other.kind(), other.to_string()),
        }
    }
}
