//! Pure deviation and severity rules.

use ledgerline_shared::types::round_money;
use rust_decimal::Decimal;

use super::types::{Severity, SeverityBands, VarianceDirection};
use crate::ledger::AccountType;

/// Percent deviation of `actual` from `baseline`, rounded to 2 places.
///
/// `None` when the baseline is zero. The denominator is `|baseline|` so a
/// rise is positive even against a negative baseline.
#[must_use]
pub fn deviation_pct(actual: Decimal, baseline: Decimal) -> Option<Decimal> {
    if baseline.is_zero() {
        return None;
    }
    Some(round_money(
        (actual - baseline) / baseline.abs() * Decimal::ONE_HUNDRED,
    ))
}

/// Maps a deviation onto the severity bands.
#[must_use]
pub fn classify(deviation: Option<Decimal>, bands: &SeverityBands) -> Severity {
    let Some(deviation) = deviation else {
        return Severity::Undefined;
    };
    let magnitude = deviation.abs();
    if magnitude < bands.warning_pct {
        Severity::Normal
    } else if magnitude <= bands.critical_pct {
        Severity::Warning
    } else {
        Severity::Critical
    }
}

/// Over-baseline cost is unfavourable; over-baseline income is favourable.
#[must_use]
pub fn direction(account_type: AccountType, actual: Decimal, baseline: Decimal) -> VarianceDirection {
    if actual == baseline {
        return VarianceDirection::OnTarget;
    }
    let above = actual > baseline;
    let higher_is_worse = matches!(account_type, AccountType::Expense | AccountType::Liability);
    if above == higher_is_worse {
        VarianceDirection::Unfavourable
    } else {
        VarianceDirection::Favourable
    }
}
