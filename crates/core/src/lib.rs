//! Core financial engines for Ledgerline.
//!
//! This crate holds the business logic and reaches persistence only through
//! the async traits in [`store`]. It has no database or web dependencies.
//!
//! # Modules
//!
//! - `ledger` - Double-entry ledger and the period sync engine
//! - `tax` - Tax rule resolution and calculation
//! - `proration` - Subscription plan-change and cancellation proration
//! - `reports` - P&L, cash flow, working capital and forecasts
//! - `variance` - Budget and trailing-average variance detection
//! - `alerts` - Alert rule evaluation and dispatch
//! - `pipeline` - Per-tenant sequencing of sync, alerts and variance

pub mod alerts;
pub mod ledger;
pub mod pipeline;
pub mod proration;
pub mod reports;
pub mod store;
pub mod tax;
pub mod tenant;
pub mod variance;

pub use pipeline::{PipelineError, PipelineReport, PipelineSettings, StepFailure, TenantPipeline};
pub use tenant::Tenant;
