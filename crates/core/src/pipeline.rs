//! Per-tenant sync, alert and variance sequencing.
//!
//! Alerts and variance read the ledger the sync just brought up to date, so
//! they run only after the sync call returns. A sync that completes with some
//! failed documents still lets them run; a sync call that fails outright
//! skips them.

use std::sync::Arc;

use chrono::NaiveDate;
use ledgerline_shared::config::AppConfig;
use ledgerline_shared::types::TenantId;
use ledgerline_shared::{AppError, ErrorKind};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::alerts::{AlertCheckReport, AlertEvaluator};
use crate::ledger::{LedgerError, LedgerSyncService, PeriodKey, SyncOptions, SyncReport};
use crate::store::{AlertStore, LedgerStore, NotificationDispatcher, TenantStore, VarianceStore};
use crate::variance::{VarianceDetector, VarianceReport, VarianceSettings};

/// Pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Close each period once its sync finishes cleanly.
    pub close_on_sync: bool,
    /// Variance defaults for tenants without their own settings.
    pub variance: VarianceSettings,
    /// Months inspected by trend alerts.
    pub trend_periods: u32,
}

impl From<&AppConfig> for PipelineSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            close_on_sync: config.scheduler.close_on_sync,
            variance: VarianceSettings::from(&config.variance),
            trend_periods: config.alerts.trend_periods,
        }
    }
}

/// The pipeline could not run for this tenant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The sync call failed; downstream steps were skipped.
    #[error("Ledger sync failed: {0}")]
    Sync(#[from] LedgerError),
}

impl PipelineError {
    /// Returns the error code of the underlying failure.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Sync(err) => err.error_code(),
        }
    }

    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Sync(err) => err.kind(),
        }
    }

    /// Returns true if running the pipeline again may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Sync(err) => err.is_retryable(),
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Sync(err) => err.into(),
        }
    }
}

/// A downstream step that failed after a successful sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    /// `alerts` or `variance`.
    pub step: &'static str,
    /// Stable error code.
    pub error_code: &'static str,
    /// Error message.
    pub message: String,
}

/// Everything one pipeline run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Tenant.
    pub tenant_id: TenantId,
    /// Period processed.
    pub period: PeriodKey,
    /// Sync outcome.
    pub sync: SyncReport,
    /// Alert outcome, absent when the step failed.
    pub alerts: Option<AlertCheckReport>,
    /// Variance outcome, absent when the step failed.
    pub variance: Option<VarianceReport>,
    /// Downstream steps that failed.
    pub step_failures: Vec<StepFailure>,
}

/// Runs sync, alerts and variance for one tenant and period.
pub struct TenantPipeline<S, D> {
    sync: LedgerSyncService<S>,
    alerts: AlertEvaluator<S, D>,
    variance: VarianceDetector<S>,
    store: Arc<S>,
    close_on_sync: bool,
}

impl<S, D> Clone for TenantPipeline<S, D> {
    fn clone(&self) -> Self {
        Self {
            sync: self.sync.clone(),
            alerts: self.alerts.clone(),
            variance: self.variance.clone(),
            store: Arc::clone(&self.store),
            close_on_sync: self.close_on_sync,
        }
    }
}

impl<S, D> TenantPipeline<S, D>
where
    S: TenantStore + LedgerStore + VarianceStore + AlertStore,
    D: NotificationDispatcher,
{
    /// Wires the three engines over one store and dispatcher.
    #[must_use]
    pub fn new(store: Arc<S>, dispatcher: Arc<D>, settings: PipelineSettings) -> Self {
        Self {
            sync: LedgerSyncService::new(Arc::clone(&store)),
            alerts: AlertEvaluator::new(Arc::clone(&store), dispatcher, settings.trend_periods),
            variance: VarianceDetector::new(Arc::clone(&store), settings.variance),
            store,
            close_on_sync: settings.close_on_sync,
        }
    }

    /// Syncs the month, then evaluates alerts, then computes variances.
    ///
    /// Alerts are evaluated as of the earlier of today (tenant time) and the
    /// last day of the month.
    #[instrument(
        name = "tenant_pipeline",
        skip_all,
        fields(tenant_id = %tenant_id, year = year, month = month)
    )]
    pub async fn run(
        &self,
        tenant_id: TenantId,
        year: i32,
        month: u32,
        cancel: Option<CancellationToken>,
    ) -> Result<PipelineReport, PipelineError> {
        let options = SyncOptions {
            close_on_sync: self.close_on_sync,
            cancel,
        };
        let sync = match self.sync.sync_month(tenant_id, year, month, &options).await {
            Ok(report) => report,
            Err(err) => {
                warn!(error_code = err.error_code(), error = %err, "sync failed, skipping alerts and variance");
                return Err(err.into());
            }
        };
        let period = sync.period;
        let mut step_failures = Vec::new();

        let as_of = self.alert_date(tenant_id, period).await;
        let alerts = match self.alerts.check_alerts_as_of(tenant_id, as_of).await {
            Ok(report) => Some(report),
            Err(err) => {
                warn!(error_code = err.error_code(), error = %err, "alert check failed");
                step_failures.push(StepFailure {
                    step: "alerts",
                    error_code: err.error_code(),
                    message: err.to_string(),
                });
                None
            }
        };

        let variance = match self
            .variance
            .compute_period_variance(tenant_id, year, month)
            .await
        {
            Ok(report) => Some(report),
            Err(err) => {
                warn!(error_code = err.error_code(), error = %err, "variance computation failed");
                step_failures.push(StepFailure {
                    step: "variance",
                    error_code: err.error_code(),
                    message: err.to_string(),
                });
                None
            }
        };

        info!(
            posted = sync.posted,
            sync_failures = sync.failures.len(),
            alerts_triggered = alerts.as_ref().map_or(0, |a| a.triggered.len()),
            variances = variance.as_ref().map_or(0, |v| v.records.len()),
            step_failures = step_failures.len(),
            "tenant pipeline finished"
        );

        Ok(PipelineReport {
            tenant_id,
            period,
            sync,
            alerts,
            variance,
            step_failures,
        })
    }

    async fn alert_date(&self, tenant_id: TenantId, period: PeriodKey) -> NaiveDate {
        match self.store.tenant(tenant_id).await {
            Ok(Some(tenant)) => tenant.today().min(period.last_day()),
            _ => period.last_day(),
        }
    }
}
