//! Subscription proration.
//!
//! Side-effect-free functions computing credits, charges and refunds for
//! mid-cycle plan changes and cancellations.

pub mod calculator;
pub mod error;
pub mod types;

pub use calculator::{calculate_cancellation_refund, calculate_proration, ceil_days};
pub use error::ProrationError;
pub use types::{ChangeDirection, ProrationResult, RefundResult, SubscriptionBillingState};
