//! Alert rules as stored, their resolved conditions and firing records.

use std::fmt;

use chrono::{DateTime, Utc};
use ledgerline_shared::types::{AccountId, AlertEventId, AlertRuleId, TenantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::variance::Dimension;

/// Kind of condition a rule watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    /// Current balance or month-over-month change.
    Threshold,
    /// Change across the last few months.
    Trend,
    /// Stored variance deviation for the current period.
    Anomaly,
}

/// Operator applied to the observed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Greater than.
    Gt,
    /// Less than.
    Lt,
    /// Equal to.
    Eq,
    /// Absolute percent change at least the target.
    PctChange,
}

/// A tenant-defined alert rule, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRule {
    /// Rule ID.
    pub id: AlertRuleId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
    /// Condition kind.
    pub condition_type: ConditionType,
    /// Operator.
    pub operator: Operator,
    /// Target value (an amount or a percentage).
    pub target_value: Decimal,
    /// Watched account.
    #[serde(default)]
    pub applies_to_account_id: Option<AccountId>,
    /// Watched account group.
    #[serde(default)]
    pub applies_to_group: Option<String>,
    /// Notification channels.
    #[serde(default)]
    pub notify_channels: Vec<String>,
    /// Only active rules are evaluated.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Plain comparison against a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Observed above target.
    Gt,
    /// Observed below target.
    Lt,
    /// Observed equals target.
    Eq,
}

impl Comparison {
    /// Applies the comparison.
    #[must_use]
    pub fn holds(self, observed: Decimal, target: Decimal) -> bool {
        match self {
            Self::Gt => observed > target,
            Self::Lt => observed < target,
            Self::Eq => observed == target,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gt => "above",
            Self::Lt => "below",
            Self::Eq => "equal to",
        })
    }
}

/// Test applied to the observed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertTest {
    /// Compare against the target.
    Compare(Comparison, Decimal),
    /// `|observed| >= target`.
    AbsAtLeast(Decimal),
}

impl AlertTest {
    /// Whether `observed` fires the rule.
    #[must_use]
    pub fn fires(self, observed: Decimal) -> bool {
        match self {
            Self::Compare(comparison, target) => comparison.holds(observed, target),
            Self::AbsAtLeast(target) => observed.abs() >= target,
        }
    }
}

impl fmt::Display for AlertTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare(comparison, target) => write!(f, "{comparison} {target}"),
            Self::AbsAtLeast(target) => write!(f, "moved by at least {target}%"),
        }
    }
}

/// What is observed for a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// Balance of the target as of the evaluation date.
    Balance,
    /// Percent change of this month's activity against last month's.
    MonthOverMonth,
    /// Percent change from the oldest to the newest of the last `periods` months.
    Trend {
        /// Months inspected, current month included.
        periods: u32,
    },
    /// Stored variance deviation of the current period.
    VarianceDeviation,
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Balance => f.write_str("balance"),
            Self::MonthOverMonth => f.write_str("month-over-month change %"),
            Self::Trend { periods } => write!(f, "{periods}-month trend %"),
            Self::VarianceDeviation => f.write_str("variance deviation %"),
        }
    }
}

/// A rule resolved into something the evaluator can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertCondition {
    /// Watched account or group.
    pub dimension: Dimension,
    /// Observed quantity.
    pub measure: Measure,
    /// Firing test.
    pub test: AlertTest,
}

/// One firing of a rule. Append-only apart from the dispatched flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Event ID.
    pub id: AlertEventId,
    /// Rule that fired.
    pub rule_id: AlertRuleId,
    /// Tenant.
    pub tenant_id: TenantId,
    /// When it fired.
    pub triggered_at: DateTime<Utc>,
    /// Observed value.
    pub observed_value: Decimal,
    /// Human-readable message.
    pub message: String,
    /// Whether a notification was enqueued.
    pub dispatched: bool,
}

/// Payload handed to the notification dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRequest {
    /// Tenant.
    pub tenant_id: TenantId,
    /// Event being announced.
    pub event_id: AlertEventId,
    /// Target channels.
    pub channels: Vec<String>,
    /// Short subject.
    pub subject: String,
    /// Message body.
    pub message: String,
}

/// A rule that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertFailure {
    /// Rule.
    pub rule_id: AlertRuleId,
    /// Rule name.
    pub rule_name: String,
    /// Stable error code.
    pub error_code: &'static str,
    /// Reason.
    pub message: String,
}

/// A fired event whose notification could not be enqueued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchFailure {
    /// Rule.
    pub rule_id: AlertRuleId,
    /// Event left undispatched.
    pub event_id: AlertEventId,
    /// Reason.
    pub message: String,
}

/// Outcome of checking all of a tenant's rules.
#[derive(Debug, Clone, Serialize)]
pub struct AlertCheckReport {
    /// Tenant.
    pub tenant_id: TenantId,
    /// Active rules looked at.
    pub evaluated: usize,
    /// Events appended.
    pub triggered: Vec<AlertEvent>,
    /// Rules that could not be evaluated.
    pub failures: Vec<AlertFailure>,
    /// Events whose notification failed.
    pub dispatch_failures: Vec<DispatchFailure>,
}
