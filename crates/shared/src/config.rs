//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Scheduler configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Variance detection defaults.
    #[serde(default)]
    pub variance: VarianceConfig,
    /// Alert evaluation defaults.
    #[serde(default)]
    pub alerts: AlertConfig,
    /// Data source configuration.
    #[serde(default)]
    pub data: DataConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum number of tenant pipelines running at once.
    #[serde(default = "default_max_parallel_tenants")]
    pub max_parallel_tenants: usize,
    /// Close the period once its sync finishes without failures.
    #[serde(default)]
    pub close_on_sync: bool,
    /// Period to process as `YYYY-MM`; the current month when unset.
    #[serde(default)]
    pub period: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_parallel_tenants: default_max_parallel_tenants(),
            close_on_sync: false,
            period: None,
        }
    }
}

fn default_max_parallel_tenants() -> usize {
    4
}

/// Default severity bands and baseline window for variance detection.
#[derive(Debug, Clone, Deserialize)]
pub struct VarianceConfig {
    /// Absolute deviation (percent) at which a variance becomes a warning.
    #[serde(default = "default_warning_pct")]
    pub warning_pct: u32,
    /// Absolute deviation (percent) above which a variance is critical.
    #[serde(default = "default_critical_pct")]
    pub critical_pct: u32,
    /// Number of prior periods averaged when no budget exists.
    #[serde(default = "default_trailing_periods")]
    pub trailing_periods: u32,
}

impl Default for VarianceConfig {
    fn default() -> Self {
        Self {
            warning_pct: default_warning_pct(),
            critical_pct: default_critical_pct(),
            trailing_periods: default_trailing_periods(),
        }
    }
}

fn default_warning_pct() -> u32 {
    10
}

fn default_critical_pct() -> u32 {
    25
}

fn default_trailing_periods() -> u32 {
    3
}

/// Alert evaluation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    /// Number of periods inspected by trend rules.
    #[serde(default = "default_trend_periods")]
    pub trend_periods: u32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            trend_periods: default_trend_periods(),
        }
    }
}

fn default_trend_periods() -> u32 {
    3
}

/// Data source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Path of the JSON snapshot loaded into the store at startup.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

fn default_snapshot_path() -> String {
    "fixtures/demo-snapshot.json".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("LEDGERLINE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
