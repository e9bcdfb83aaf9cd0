//! Alert rule evaluation.
//!
//! Stored rules are resolved into typed conditions, evaluated against the
//! ledger and stored variances, and fired alerts are recorded and handed to
//! the notification dispatcher.

pub mod condition;
pub mod error;
pub mod evaluator;
pub mod types;

pub use error::AlertError;
pub use evaluator::AlertEvaluator;
pub use types::{
    AlertCheckReport, AlertCondition, AlertEvent, AlertFailure, AlertRule, AlertTest, Comparison,
    ConditionType, DispatchFailure, DispatchRequest, Measure, Operator,
};
