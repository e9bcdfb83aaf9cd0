//! Period variance detection against budgets or trailing averages.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use ledgerline_shared::types::{AccountId, TenantId, round_money};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use super::classify::{classify, deviation_pct, direction};
use super::error::VarianceError;
use super::types::{
    BaselineSource, Dimension, Severity, VarianceFailure, VarianceRecord, VarianceReport,
    VarianceSettings,
};
use crate::ledger::{ChartOfAccounts, JournalEntry, PeriodKey};
use crate::store::{LedgerStore, TenantStore, VarianceStore};

/// Normal-signed activity per `(period, account)`.
#[derive(Debug, Default)]
struct Activity(HashMap<(PeriodKey, AccountId), Decimal>);

impl Activity {
    fn collect(chart: &ChartOfAccounts, entries: &[JournalEntry]) -> Self {
        let mut totals = HashMap::new();
        for entry in entries {
            let period = entry.period();
            for line in entry.lines() {
                let Some(account) = chart.get(line.account_id) else {
                    continue;
                };
                *totals.entry((period, account.id)).or_insert(Decimal::ZERO) +=
                    account.normal_balance().signed(line.debit, line.credit);
            }
        }
        Self(totals)
    }

    fn total(&self, period: PeriodKey, accounts: &[AccountId]) -> Decimal {
        accounts
            .iter()
            .filter_map(|id| self.0.get(&(period, *id)))
            .copied()
            .sum()
    }
}

/// Every active revenue and expense account.
fn default_dimensions(chart: &ChartOfAccounts) -> Vec<Dimension> {
    chart
        .accounts()
        .iter()
        .filter(|a| a.is_active && a.account_type.is_income_statement())
        .map(|a| Dimension::Account(a.id))
        .collect()
}

/// Computes and stores period variances.
pub struct VarianceDetector<S> {
    store: Arc<S>,
    defaults: VarianceSettings,
}

impl<S> Clone for VarianceDetector<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            defaults: self.defaults.clone(),
        }
    }
}

impl<S> VarianceDetector<S>
where
    S: TenantStore + LedgerStore + VarianceStore,
{
    /// Creates a detector. `defaults` apply to tenants without their own settings.
    #[must_use]
    pub const fn new(store: Arc<S>, defaults: VarianceSettings) -> Self {
        Self { store, defaults }
    }

    /// Measures every tracked dimension for the month and upserts one record each.
    ///
    /// A dimension whose account or group no longer exists is reported as a
    /// failure and skipped. Store errors abort the call.
    #[instrument(
        name = "compute_period_variance",
        skip_all,
        fields(tenant_id = %tenant_id, year = year, month = month)
    )]
    pub async fn compute_period_variance(
        &self,
        tenant_id: TenantId,
        year: i32,
        month: u32,
    ) -> Result<VarianceReport, VarianceError> {
        let period = PeriodKey::new(tenant_id, year, month)
            .map_err(|_| VarianceError::InvalidPeriod { year, month })?;
        self.store
            .tenant(tenant_id)
            .await?
            .ok_or(VarianceError::TenantNotFound(tenant_id))?;

        let settings = self
            .store
            .variance_settings(tenant_id)
            .await?
            .unwrap_or_else(|| self.defaults.clone());
        let chart = ChartOfAccounts::for_tenant(tenant_id, self.store.accounts(tenant_id).await?);
        let dimensions = if settings.dimensions.is_empty() {
            default_dimensions(&chart)
        } else {
            settings.dimensions.clone()
        };

        let mut synced = Vec::new();
        for prior in period.trailing(settings.trailing_periods) {
            if self
                .store
                .period(prior)
                .await?
                .is_some_and(|p| p.has_synced())
            {
                synced.push(prior);
            }
        }

        let from = synced.first().map_or(period.first_day(), PeriodKey::first_day);
        let entries = self
            .store
            .entries_between(tenant_id, from, period.last_day())
            .await?;
        let activity = Activity::collect(&chart, &entries);

        let computed_at = Utc::now();
        let mut records = Vec::with_capacity(dimensions.len());
        let mut failures = Vec::new();

        for dimension in dimensions {
            let Some((accounts, account_type)) = dimension.resolve(&chart) else {
                warn!(dimension = %dimension, "variance dimension has no accounts");
                failures.push(VarianceFailure {
                    message: format!("No accounts found for {dimension}"),
                    dimension,
                });
                continue;
            };

            let actual = activity.total(period, &accounts);
            let (baseline, baseline_source) =
                match self.store.budget_amount(period, &dimension).await? {
                    Some(budget) => (budget, BaselineSource::Budget),
                    None => (
                        trailing_average(&activity, &synced, &accounts),
                        BaselineSource::TrailingAverage,
                    ),
                };
            let deviation = deviation_pct(actual, baseline);

            let record = VarianceRecord {
                tenant_id,
                period,
                dimension,
                actual,
                baseline,
                deviation_pct: deviation,
                severity: classify(deviation, &settings.bands),
                baseline_source,
                direction: direction(account_type, actual, baseline),
                computed_at,
            };
            self.store.upsert_variance(record.clone()).await?;
            records.push(record);
        }

        info!(
            period = %period,
            records = records.len(),
            critical = records.iter().filter(|r| r.severity == Severity::Critical).count(),
            failed = failures.len(),
            "variance computed"
        );

        Ok(VarianceReport {
            tenant_id,
            period,
            records,
            failures,
        })
    }
}

/// Mean activity over the synced prior periods, or zero when there are none.
fn trailing_average(activity: &Activity, synced: &[PeriodKey], accounts: &[AccountId]) -> Decimal {
    if synced.is_empty() {
        return Decimal::ZERO;
    }
    let sum: Decimal = synced.iter().map(|p| activity.total(*p, accounts)).sum();
    round_money(sum / Decimal::from(synced.len()))
}
