//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.
//!
//! Rounding happens once, at the output boundary, using round-half-up.
//! Intermediate values keep the full `Decimal` precision, which is always
//! at least [`WORKING_SCALE`] fractional digits.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fractional digits of a settled monetary amount.
pub const MONEY_SCALE: u32 = 2;

/// Minimum fractional digits retained by intermediate calculations.
pub const WORKING_SCALE: u32 = 6;

/// Errors raised by money arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Division by a zero or negative unit count (e.g. days in a billing cycle).
    #[error("Division by non-positive divisor: {divisor}")]
    DivisionByZero {
        /// The rejected divisor.
        divisor: Decimal,
    },

    /// The result does not fit in a `Decimal`.
    #[error("Arithmetic overflow in {operation}")]
    Overflow {
        /// Operation that overflowed.
        operation: &'static str,
    },

    /// Arithmetic between two different currencies.
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch {
        /// Left operand currency.
        left: Currency,
        /// Right operand currency.
        right: Currency,
    },
}

/// Represents a monetary amount with currency.
///
/// Uses `Decimal` internally to avoid floating-point precision errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount in major units (e.g. rupees, with paise as fraction).
    pub amount: Decimal,
    /// ISO 4217 currency code (e.g., "INR", "USD").
    pub currency: Currency,
}

/// ISO 4217 currency codes supported by the system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Indian Rupee
    #[default]
    Inr,
    /// US Dollar
    Usd,
    /// Euro
    Eur,
    /// Singapore Dollar
    Sgd,
    /// Indonesian Rupiah
    Idr,
    /// Japanese Yen
    Jpy,
}

impl Currency {
    /// Number of minor-unit digits used when settling amounts.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Self::Jpy => 0,
            _ => MONEY_SCALE,
        }
    }
}

/// Rounds a settled amount to 2 decimal places using round-half-up.
///
/// `2.345 → 2.35`, `-2.345 → -2.35` (ties move away from zero).
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    round_to(value, MONEY_SCALE)
}

/// Rounds to `dp` decimal places using round-half-up.
#[must_use]
pub fn round_to(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Divides `amount` by a unit count without rounding.
///
/// Used for per-day rates. Fails instead of producing a meaningless value
/// when `units` is zero or negative.
pub fn per_unit(amount: Decimal, units: Decimal) -> Result<Decimal, MoneyError> {
    if units <= Decimal::ZERO {
        return Err(MoneyError::DivisionByZero { divisor: units });
    }
    Ok(amount / units)
}

/// Applies a percentage rate (`18` means 18%) without rounding.
pub fn apply_rate_pct(amount: Decimal, rate_pct: Decimal) -> Result<Decimal, MoneyError> {
    amount
        .checked_mul(rate_pct)
        .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(MoneyError::Overflow {
            operation: "rate application",
        })
}

/// Sums amounts, failing instead of panicking when the total overflows.
pub fn checked_sum<I>(amounts: I) -> Result<Decimal, MoneyError>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, Decimal::checked_add)
        .ok_or(MoneyError::Overflow { operation: "sum" })
}

/// Percentage `part / whole * 100` rounded to 2 places, or zero when `whole` is zero.
#[must_use]
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        round_money(part / whole * Decimal::ONE_HUNDRED)
    }
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Creates an INR amount.
    #[must_use]
    pub const fn inr(amount: Decimal) -> Self {
        Self::new(amount, Currency::Inr)
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Adds two amounts of the same currency.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(MoneyError::Overflow { operation: "add" })?;
        Ok(Self::new(amount, self.currency))
    }

    /// Subtracts two amounts of the same currency.
    pub fn checked_sub(self, other: Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(MoneyError::Overflow {
                operation: "subtract",
            })?;
        Ok(Self::new(amount, self.currency))
    }

    /// Returns the amount rounded to the currency's minor units.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self::new(
            round_to(self.amount, self.currency.minor_units()),
            self.currency,
        )
    }

    fn ensure_same_currency(self, other: Self) -> Result<(), MoneyError> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            })
        }
    }
}

/// Groups the integer digits: Indian style (`12,34,567`) for INR, thousands otherwise.
fn group_digits(digits: &str, indian: bool) -> String {
    let len = digits.len();
    if len <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(len - 3);
    let group = if indian { 2 } else { 3 };
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(group);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{tail}", groups.join(","))
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dp = self.currency.minor_units();
        let rounded = round_to(self.amount, dp);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let abs = rounded.abs();
        let text = format!("{abs:.prec$}", prec = dp as usize);
        let (int_part, frac_part) = match text.split_once('.') {
            Some((i, frac)) => (i.to_string(), Some(frac.to_string())),
            None => (text, None),
        };
        let grouped = group_digits(&int_part, self.currency == Currency::Inr);

        match self.currency {
            Currency::Inr => write!(f, "{sign}₹{grouped}")?,
            other => write!(f, "{other} {sign}{grouped}")?,
        }
        if let Some(frac) = frac_part {
            write!(f, ".{frac}")?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inr => write!(f, "INR"),
            Self::Usd => write!(f, "USD"),
            Self::Eur => write!(f, "EUR"),
            Self::Sgd => write!(f, "SGD"),
            Self::Idr => write!(f, "IDR"),
            Self::Jpy => write!(f, "JPY"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "INR" => Ok(Self::Inr),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "SGD" => Ok(Self::Sgd),
            "IDR" => Ok(Self::Idr),
            "JPY" => Ok(Self::Jpy),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

#[cfg(test)]
#[path = "money_tests.rs"]
mod tests;
