//! Proration inputs and results.

use chrono::{DateTime, Utc};
use ledgerline_shared::types::{SubscriptionId, TenantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a plan change moves the price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeDirection {
    /// New price is higher.
    Upgrade,
    /// New price is lower.
    Downgrade,
    /// Same price.
    NoChange,
}

/// Result of a mid-cycle plan change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProrationResult {
    /// Whole days in the cycle (rounded up).
    pub total_days: i64,
    /// Days elapsed at the change (rounded up).
    pub days_used: i64,
    /// `total_days - days_used`.
    pub days_remaining: i64,
    /// Unused value of the current plan, rounded.
    pub credit_amount: Decimal,
    /// Remaining-cycle cost of the new plan, rounded.
    pub charge_amount: Decimal,
    /// `max(0, charge - credit)`.
    pub net_charge: Decimal,
    /// Credit not returned because the net charge is floored at zero.
    pub forfeited_credit: Decimal,
    /// Price movement.
    pub direction: ChangeDirection,
}

/// Result of a cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundResult {
    /// Whole days in the cycle (rounded up).
    pub total_days: i64,
    /// Days from cancellation to cycle end (rounded up).
    pub days_remaining: i64,
    /// Refund for the unused days, rounded.
    pub refund_amount: Decimal,
}

/// A subscription's current plan and billing window.
///
/// Owned by the billing subsystem; read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionBillingState {
    /// Subscription ID.
    pub subscription_id: SubscriptionId,
    /// Tenant billed.
    pub tenant_id: TenantId,
    /// Current plan code.
    pub plan_code: String,
    /// Price of the current plan per cycle.
    pub price: Decimal,
    /// Cycle start.
    pub cycle_start: DateTime<Utc>,
    /// Cycle end.
    pub cycle_end: DateTime<Utc>,
}
