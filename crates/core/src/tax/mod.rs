//! Tax rule engine.
//!
//! Resolves which of a tenant's rules apply to each line item and computes
//! per-item and aggregate tax. Pure functions only; rules are passed in.

pub mod engine;
pub mod error;
pub mod types;

#[cfg(test)]
mod props;

pub use engine::calculate_tax;
pub use error::TaxError;
pub use types::{ItemTax, LineItem, TaxCalculation, TaxComponent, TaxRule, TaxScope, TaxType};
