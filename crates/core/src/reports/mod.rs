//! Financial reports over posted journal entries.
//!
//! - Profit and loss summary and monthly trend
//! - Daily cash flow and cash position
//! - Working capital
//! - Cash forecast
//! - Cash conversion cycle

pub mod cache;
pub mod error;
pub mod reader;
pub mod service;
pub mod types;


pub use cache::{PlCacheKey, PlSummaryCache};
pub use error::ReportError;
pub use reader::{CASH_CYCLE_LOOKBACK_DAYS, FORECAST_LOOKBACK_DAYS, ReportReader};
pub use service::{MAX_FORECAST_DAYS, ReportService};
pub use types::*;
