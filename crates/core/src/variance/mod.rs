//! Variance detection.
//!
//! Compares each tracked dimension's period activity with its budget, or
//! with the average of recent synced periods, and classifies the deviation.

pub mod classify;
pub mod detector;
pub mod error;
pub mod types;

#[cfg(test)]
mod props;

pub use classify::{classify, deviation_pct, direction};
pub use detector::VarianceDetector;
pub use error::VarianceError;
pub use types::{
    BaselineSource, Dimension, Severity, SeverityBands, VarianceDirection, VarianceFailure,
    VarianceRecord, VarianceReport, VarianceSettings,
};
