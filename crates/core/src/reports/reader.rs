//! Store-backed report queries.
//!
//! Loads the chart and entries through [`LedgerStore`] and hands them to
//! [`ReportService`]. P&L summaries are cached per ledger and chart version.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use ledgerline_shared::types::TenantId;
use tracing::{debug, instrument};

use super::cache::{PlCacheKey, PlSummaryCache};
use super::error::ReportError;
use super::service::{ReportService, check_horizon};
use super::types::{
    CashConversionCycle, CashCycleTerms, CashFlowReport, CashForecast, CashPosition, PlSummary,
    PlTrend, WorkingCapital,
};
use crate::ledger::{ChartOfAccounts, JournalEntry};
use crate::store::{LedgerStore, TenantStore};
use crate::tenant::Tenant;

/// Days of history behind a cash forecast.
pub const FORECAST_LOOKBACK_DAYS: u32 = 90;

/// Days of paid invoices behind a cash conversion cycle.
pub const CASH_CYCLE_LOOKBACK_DAYS: u32 = 365;

/// Answers report queries for one store.
pub struct ReportReader<S> {
    store: Arc<S>,
    cache: PlSummaryCache,
}

impl<S> Clone for ReportReader<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: self.cache.clone(),
        }
    }
}

impl<S> ReportReader<S>
where
    S: TenantStore + LedgerStore,
{
    /// Creates a reader with a default cache.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self::with_cache(store, PlSummaryCache::new())
    }

    /// Creates a reader sharing an existing cache.
    #[must_use]
    pub const fn with_cache(store: Arc<S>, cache: PlSummaryCache) -> Self {
        Self { store, cache }
    }

    /// P&L over `[start, end]`, served from cache when neither the ledger nor
    /// the chart has changed since it was computed.
    #[instrument(name = "pl_summary", skip_all, fields(tenant_id = %tenant_id, start = %start, end = %end))]
    pub async fn pl_summary(
        &self,
        tenant_id: TenantId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PlSummary, ReportError> {
        if start > end {
            return Err(ReportError::InvalidDateRange { start, end });
        }
        let tenant = self.tenant(tenant_id).await?;
        let key = PlCacheKey {
            tenant_id,
            start,
            end,
            ledger_version: self.store.ledger_version(tenant_id).await?,
            chart_version: self.store.chart_version(tenant_id).await?,
        };
        if let Some(cached) = self.cache.get(&key) {
            debug!(
                ledger_version = key.ledger_version,
                chart_version = key.chart_version,
                "P&L served from cache"
            );
            return Ok((*cached).clone());
        }

        let chart = self.chart(tenant_id).await?;
        let entries = self.store.entries_between(tenant_id, start, end).await?;
        let summary = ReportService::pl_summary(&tenant, &chart, &entries, start, end)?;

        // A post or chart edit that landed while we were reading would make
        // this result belong to neither version.
        if self.store.ledger_version(tenant_id).await? == key.ledger_version
            && self.store.chart_version(tenant_id).await? == key.chart_version
        {
            self.cache.insert(key, Arc::new(summary.clone()));
        }
        Ok(summary)
    }

    /// Monthly P&L for `year`.
    pub async fn pl_trend(&self, tenant_id: TenantId, year: i32) -> Result<PlTrend, ReportError> {
        self.tenant(tenant_id).await?;
        let (Some(start), Some(end)) = (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) else {
            return Err(ReportError::EmptyWindow("trend year"));
        };
        let chart = self.chart(tenant_id).await?;
        let entries = self.store.entries_between(tenant_id, start, end).await?;
        Ok(ReportService::pl_trend(tenant_id, &chart, &entries, year))
    }

    /// Daily cash flow over the `days` days ending on `as_of`.
    #[instrument(name = "cash_flow_daily", skip_all, fields(tenant_id = %tenant_id, days = days))]
    pub async fn cash_flow_daily(
        &self,
        tenant_id: TenantId,
        days: u32,
        as_of: NaiveDate,
    ) -> Result<CashFlowReport, ReportError> {
        if days == 0 {
            return Err(ReportError::EmptyWindow("cash flow window"));
        }
        self.tenant(tenant_id).await?;
        let start = as_of
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .ok_or(ReportError::EmptyWindow("cash flow window"))?;
        let chart = self.chart(tenant_id).await?;
        let entries = self.history(tenant_id, as_of).await?;
        ReportService::cash_flow_daily(tenant_id, &chart, &entries, start, as_of)
    }

    /// Cash balance at the end of `as_of`.
    pub async fn cash_position(
        &self,
        tenant_id: TenantId,
        as_of: NaiveDate,
    ) -> Result<CashPosition, ReportError> {
        self.tenant(tenant_id).await?;
        let chart = self.chart(tenant_id).await?;
        let entries = self.history(tenant_id, as_of).await?;
        Ok(ReportService::cash_position(tenant_id, &chart, &entries, as_of))
    }

    /// Cash balance as of today in the tenant's timezone.
    pub async fn current_cash_position(
        &self,
        tenant_id: TenantId,
    ) -> Result<CashPosition, ReportError> {
        let today = self.tenant(tenant_id).await?.today();
        self.cash_position(tenant_id, today).await
    }

    /// Working capital at the end of `as_of`.
    pub async fn working_capital(
        &self,
        tenant_id: TenantId,
        as_of: NaiveDate,
    ) -> Result<WorkingCapital, ReportError> {
        self.tenant(tenant_id).await?;
        let chart = self.chart(tenant_id).await?;
        let entries = self.history(tenant_id, as_of).await?;
        Ok(ReportService::working_capital(tenant_id, &chart, &entries, as_of))
    }

    /// Projects cash `days_ahead` days past `as_of` from the trailing
    /// [`FORECAST_LOOKBACK_DAYS`] days.
    pub async fn forecast_cash_flow(
        &self,
        tenant_id: TenantId,
        days_ahead: u32,
        as_of: NaiveDate,
    ) -> Result<CashForecast, ReportError> {
        check_horizon(days_ahead)?;
        let history = self
            .cash_flow_daily(tenant_id, FORECAST_LOOKBACK_DAYS, as_of)
            .await?;
        ReportService::forecast(&history, days_ahead)
    }

    /// Cash conversion cycle from invoices paid in the
    /// [`CASH_CYCLE_LOOKBACK_DAYS`] tenant-local days ending on `as_of`.
    #[instrument(name = "cash_conversion_cycle", skip_all, fields(tenant_id = %tenant_id, as_of = %as_of))]
    pub async fn cash_conversion_cycle(
        &self,
        tenant_id: TenantId,
        as_of: NaiveDate,
        terms: &CashCycleTerms,
    ) -> Result<CashConversionCycle, ReportError> {
        let tenant = self.tenant(tenant_id).await?;
        let window = ReportError::EmptyWindow("cash conversion window");
        let from = as_of
            .checked_sub_days(Days::new(u64::from(CASH_CYCLE_LOOKBACK_DAYS - 1)))
            .and_then(|first| tenant.start_of_day(first))
            .ok_or_else(|| window.clone())?;
        let until = as_of
            .succ_opt()
            .and_then(|next| tenant.start_of_day(next))
            .ok_or(window)?;
        let invoices = self.store.source_transactions(tenant_id, from, until).await?;
        let cycle = ReportService::cash_conversion_cycle(tenant_id, &invoices, as_of, terms);
        debug!(
            sample_size = cycle.sample_size,
            days = %cycle.cash_conversion_cycle,
            "Cash conversion cycle computed"
        );
        Ok(cycle)
    }

    async fn tenant(&self, tenant_id: TenantId) -> Result<Tenant, ReportError> {
        self.store
            .tenant(tenant_id)
            .await?
            .ok_or(ReportError::TenantNotFound(tenant_id))
    }

    async fn chart(&self, tenant_id: TenantId) -> Result<ChartOfAccounts, ReportError> {
        Ok(ChartOfAccounts::for_tenant(
            tenant_id,
            self.store.accounts(tenant_id).await?,
        ))
    }

    async fn history(
        &self,
        tenant_id: TenantId,
        as_of: NaiveDate,
    ) -> Result<Vec<JournalEntry>, ReportError> {
        Ok(self
            .store
            .entries_between(tenant_id, NaiveDate::MIN, as_of)
            .await?)
    }
}
