//! Pure proration functions.
//!
//! Per-day rates keep full precision; only the credit, charge and refund
//! outputs are rounded (half-up, 2 places).

use chrono::{DateTime, Utc};
use ledgerline_shared::types::{per_unit, round_money};
use rust_decimal::Decimal;

use super::error::ProrationError;
use super::types::{ChangeDirection, ProrationResult, RefundResult, SubscriptionBillingState};

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days from `from` to `to`, rounded up.
#[must_use]
pub fn ceil_days(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let seconds = (to - from).num_seconds();
    (seconds + SECONDS_PER_DAY - 1).div_euclid(SECONDS_PER_DAY)
}

fn ensure_non_negative(field: &'static str, amount: Decimal) -> Result<(), ProrationError> {
    if amount < Decimal::ZERO {
        return Err(ProrationError::NegativePrice { field, amount });
    }
    Ok(())
}

fn ensure_within(
    date: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), ProrationError> {
    if date < start || date > end {
        return Err(ProrationError::InvalidDateRange { date, start, end });
    }
    Ok(())
}

/// Prices a plan change at `change_date` inside `[cycle_start, cycle_end]`.
///
/// A downgrade never produces a negative bill: the net charge is floored at
/// zero and the dropped amount is reported as `forfeited_credit`.
pub fn calculate_proration(
    current_price: Decimal,
    new_price: Decimal,
    cycle_start: DateTime<Utc>,
    cycle_end: DateTime<Utc>,
    change_date: DateTime<Utc>,
) -> Result<ProrationResult, ProrationError> {
    ensure_non_negative("current_price", current_price)?;
    ensure_non_negative("new_price", new_price)?;

    let total_days = ceil_days(cycle_start, cycle_end);
    let days = Decimal::from(total_days);
    let current_per_day = per_unit(current_price, days)?;
    let new_per_day = per_unit(new_price, days)?;

    ensure_within(change_date, cycle_start, cycle_end)?;

    let days_used = ceil_days(cycle_start, change_date);
    let days_remaining = total_days - days_used;
    let remaining = Decimal::from(days_remaining);

    let credit_amount = round_money(current_per_day * remaining);
    let charge_amount = round_money(new_per_day * remaining);
    let difference = charge_amount - credit_amount;

    let direction = match new_price.cmp(&current_price) {
        std::cmp::Ordering::Greater => ChangeDirection::Upgrade,
        std::cmp::Ordering::Less => ChangeDirection::Downgrade,
        std::cmp::Ordering::Equal => ChangeDirection::NoChange,
    };

    Ok(ProrationResult {
        total_days,
        days_used,
        days_remaining,
        credit_amount,
        charge_amount,
        net_charge: difference.max(Decimal::ZERO),
        forfeited_credit: (-difference).max(Decimal::ZERO),
        direction,
    })
}

/// Refund for cancelling at `cancellation_date` inside `[cycle_start, cycle_end]`.
pub fn calculate_cancellation_refund(
    plan_price: Decimal,
    cycle_start: DateTime<Utc>,
    cycle_end: DateTime<Utc>,
    cancellation_date: DateTime<Utc>,
) -> Result<RefundResult, ProrationError> {
    ensure_non_negative("plan_price", plan_price)?;

    let total_days = ceil_days(cycle_start, cycle_end);
    let per_day = per_unit(plan_price, Decimal::from(total_days))?;

    ensure_within(cancellation_date, cycle_start, cycle_end)?;

    let days_remaining = ceil_days(cancellation_date, cycle_end);
    let refund_amount = if days_remaining <= 0 {
        Decimal::ZERO
    } else {
        round_money(per_day * Decimal::from(days_remaining))
    };

    Ok(RefundResult {
        total_days,
        days_remaining,
        refund_amount,
    })
}

impl SubscriptionBillingState {
    /// Prorates a switch to a plan priced `new_price`.
    pub fn prorate_change(
        &self,
        new_price: Decimal,
        change_date: DateTime<Utc>,
    ) -> Result<ProrationResult, ProrationError> {
        calculate_proration(
            self.price,
            new_price,
            self.cycle_start,
            self.cycle_end,
            change_date,
        )
    }

    /// Refund owed when cancelling at `cancellation_date`.
    pub fn cancellation_refund(
        &self,
        cancellation_date: DateTime<Utc>,
    ) -> Result<RefundResult, ProrationError> {
        calculate_cancellation_refund(self.price, self.cycle_start, self.cycle_end, cancellation_date)
    }
}
