//! Common types used across the workspace.

pub mod id;
pub mod money;

pub use id::*;
pub use money::{
    Currency, MONEY_SCALE, Money, MoneyError, WORKING_SCALE, apply_rate_pct, checked_sum, per_unit,
    percent_of,
    round_money, round_to,
};
