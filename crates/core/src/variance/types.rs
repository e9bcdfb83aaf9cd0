//! Variance data types.

use std::fmt;

use chrono::{DateTime, Utc};
use ledgerline_shared::config::VarianceConfig;
use ledgerline_shared::types::{AccountId, TenantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{AccountType, ChartOfAccounts, PeriodKey};

/// What a variance is measured over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Dimension {
    /// One ledger account.
    Account(AccountId),
    /// Every account of a reporting group.
    Group(String),
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account(id) => write!(f, "account:{id}"),
            Self::Group(name) => write!(f, "group:{name}"),
        }
    }
}

impl Dimension {
    /// Accounts measured by this dimension and the account type that decides
    /// direction. An account includes its sub-accounts.
    ///
    /// `None` when the account or group does not exist in `chart`.
    #[must_use]
    pub fn resolve(&self, chart: &ChartOfAccounts) -> Option<(Vec<AccountId>, AccountType)> {
        match self {
            Self::Account(id) => chart
                .get(*id)
                .map(|account| (chart.subtree(*id), account.account_type)),
            Self::Group(name) => {
                let accounts: Vec<_> = chart.in_group(name).collect();
                let account_type = accounts.first()?.account_type;
                Some((accounts.iter().map(|a| a.id).collect(), account_type))
            }
        }
    }
}

/// Severity band of a deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Below the warning band.
    Normal,
    /// Inside the warning band.
    Warning,
    /// Above the critical threshold.
    Critical,
    /// Baseline is zero, so no percentage exists.
    Undefined,
}

/// Where the baseline came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineSource {
    /// Configured budget for the period.
    Budget,
    /// Average of previous synced periods.
    TrailingAverage,
}

/// Whether the deviation is good or bad news.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceDirection {
    /// Revenue above or cost below baseline.
    Favourable,
    /// Revenue below or cost above baseline.
    Unfavourable,
    /// Actual equals baseline.
    OnTarget,
}

/// Percent thresholds separating the severity bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityBands {
    /// `|d|` at or above this is a warning.
    pub warning_pct: Decimal,
    /// `|d|` above this is critical.
    pub critical_pct: Decimal,
}

impl Default for SeverityBands {
    fn default() -> Self {
        Self {
            warning_pct: Decimal::TEN,
            critical_pct: Decimal::from(25),
        }
    }
}

/// Tenant variance configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarianceSettings {
    /// Severity thresholds.
    #[serde(default)]
    pub bands: SeverityBands,
    /// Prior periods averaged when no budget is configured.
    #[serde(default = "default_trailing_periods")]
    pub trailing_periods: u32,
    /// Tracked dimensions. Empty means every active revenue and expense account.
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
}

fn default_trailing_periods() -> u32 {
    3
}

impl Default for VarianceSettings {
    fn default() -> Self {
        Self {
            bands: SeverityBands::default(),
            trailing_periods: default_trailing_periods(),
            dimensions: Vec::new(),
        }
    }
}

/// Variance of one dimension in one period.
///
/// Keyed by `(tenant, period, dimension)`; recomputation replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarianceRecord {
    /// Tenant.
    pub tenant_id: TenantId,
    /// Period measured.
    pub period: PeriodKey,
    /// Dimension measured.
    pub dimension: Dimension,
    /// Normal-signed activity in the period.
    pub actual: Decimal,
    /// Budget or trailing average.
    pub baseline: Decimal,
    /// `(actual - baseline) / |baseline| * 100`, 2 places; absent when baseline is zero.
    pub deviation_pct: Option<Decimal>,
    /// Severity band.
    pub severity: Severity,
    /// Baseline origin.
    pub baseline_source: BaselineSource,
    /// Good or bad news.
    pub direction: VarianceDirection,
    /// When the record was computed.
    pub computed_at: DateTime<Utc>,
}

/// A tracked dimension that could not be measured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarianceFailure {
    /// Dimension.
    pub dimension: Dimension,
    /// Reason.
    pub message: String,
}

/// Outcome of a variance computation for one period.
#[derive(Debug, Clone, Serialize)]
pub struct VarianceReport {
    /// Tenant.
    pub tenant_id: TenantId,
    /// Period.
    pub period: PeriodKey,
    /// Records written.
    pub records: Vec<VarianceRecord>,
    /// Dimensions skipped.
    pub failures: Vec<VarianceFailure>,
}

impl VarianceReport {
    /// Records at or above `severity` (excluding undefined).
    pub fn at_least(&self, severity: Severity) -> impl Iterator<Item = &VarianceRecord> {
        self.records
            .iter()
            .filter(move |r| r.severity != Severity::Undefined && r.severity >= severity)
    }
}

impl From<&VarianceConfig> for VarianceSettings {
    fn from(config: &VarianceConfig) -> Self {
        Self {
            bands: SeverityBands {
                warning_pct: Decimal::from(config.warning_pct),
                critical_pct: Decimal::from(config.critical_pct),
            },
            trailing_periods: config.trailing_periods,
            dimensions: Vec::new(),
        }
    }
}
