//! Tax engine error types.

use ledgerline_shared::types::TaxRuleId;
use ledgerline_shared::{AppError, ErrorKind};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while resolving and computing tax.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxError {
    /// Item quantity must be positive.
    #[error("Item {index}: quantity must be positive, got {quantity}")]
    InvalidQuantity {
        /// Item position.
        index: usize,
        /// Rejected quantity.
        quantity: Decimal,
    },

    /// Item unit price cannot be negative.
    #[error("Item {index}: unit price cannot be negative, got {unit_price}")]
    NegativeUnitPrice {
        /// Item position.
        index: usize,
        /// Rejected price.
        unit_price: Decimal,
    },

    /// Rule rate outside 0..=100.
    #[error("Tax rule {rule_id}: rate {rate} is outside 0-100")]
    InvalidRate {
        /// Offending rule.
        rule_id: TaxRuleId,
        /// Rejected rate.
        rate: Decimal,
    },

    /// An amount left the representable decimal range.
    #[error("Item {index}: tax amounts overflow")]
    AmountOverflow {
        /// Item position.
        index: usize,
    },

    /// Matching rules cannot be combined without guessing.
    #[error("Item {item_index}: conflicting tax rules ({reason})")]
    RuleConflict {
        /// Item position.
        item_index: usize,
        /// What clashes.
        reason: String,
        /// Rules involved.
        rule_ids: Vec<TaxRuleId>,
    },
}

impl TaxError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::NegativeUnitPrice { .. } => "NEGATIVE_UNIT_PRICE",
            Self::InvalidRate { .. } => "INVALID_TAX_RATE",
            Self::RuleConflict { .. } => "TAX_RULE_CONFLICT",
            Self::AmountOverflow { .. } => "TAX_AMOUNT_OVERFLOW",
        }
    }

    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RuleConflict { .. } => ErrorKind::Conflict,
            Self::AmountOverflow { .. } => ErrorKind::Arithmetic,
            _ => ErrorKind::Validation,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::RuleConflict { .. } => 409,
            Self::AmountOverflow { .. } => 422,
            _ => 400,
        }
    }

    /// Tax errors need an input or configuration fix.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }
}

impl From<TaxError> for AppError {
    fn from(err: TaxError) -> Self {
        Self::from_kind(err.kind(), err.to_string())
    }
}
