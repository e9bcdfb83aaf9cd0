//! Resolution of stored rules into typed conditions.

use super::error::AlertError;
use super::types::{AlertCondition, AlertRule, AlertTest, Comparison, ConditionType, Measure, Operator};
use crate::variance::Dimension;

impl AlertRule {
    /// Resolves the raw fields into a condition.
    ///
    /// `trend_periods` is the number of months a trend rule inspects.
    pub fn resolve(&self, trend_periods: u32) -> Result<AlertCondition, AlertError> {
        let invalid = |reason: &str| AlertError::InvalidRule {
            rule_id: self.id,
            reason: reason.to_string(),
        };

        let dimension = match (&self.applies_to_account_id, &self.applies_to_group) {
            (Some(account_id), None) => Dimension::Account(*account_id),
            (None, Some(group)) if !group.trim().is_empty() => Dimension::Group(group.trim().to_string()),
            (Some(_), Some(_)) => return Err(invalid("targets both an account and a group")),
            _ => return Err(invalid("has no account or group target")),
        };

        let test = match self.operator {
            Operator::Gt => AlertTest::Compare(Comparison::Gt, self.target_value),
            Operator::Lt => AlertTest::Compare(Comparison::Lt, self.target_value),
            Operator::Eq => AlertTest::Compare(Comparison::Eq, self.target_value),
            Operator::PctChange => AlertTest::AbsAtLeast(self.target_value.abs()),
        };

        let measure = match (self.condition_type, self.operator) {
            (ConditionType::Threshold, Operator::PctChange) => Measure::MonthOverMonth,
            (ConditionType::Threshold, _) => Measure::Balance,
            (ConditionType::Trend, _) if trend_periods < 2 => {
                return Err(invalid("trend needs at least two periods"));
            }
            (ConditionType::Trend, _) => Measure::Trend {
                periods: trend_periods,
            },
            (ConditionType::Anomaly, _) => Measure::VarianceDeviation,
        };

        Ok(AlertCondition {
            dimension,
            measure,
            test,
        })
    }
}
