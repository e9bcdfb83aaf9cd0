//! Alert rule evaluation.
//!
//! Every active rule of a tenant is evaluated against one consistent read of
//! the ledger. A rule that cannot be evaluated is reported and the rest still
//! run.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use ledgerline_shared::types::{AccountId, AlertEventId, TenantId};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use super::error::AlertError;
use super::types::{
    AlertCheckReport, AlertCondition, AlertEvent, AlertFailure, AlertRule, DispatchFailure,
    DispatchRequest, Measure,
};
use crate::ledger::{ChartOfAccounts, JournalEntry, PeriodKey};
use crate::reports::ReportService;
use crate::store::{AlertStore, LedgerStore, NotificationDispatcher, TenantStore, VarianceStore};
use crate::variance::{Dimension, deviation_pct};

/// Ledger state the rules of one check are evaluated against.
struct LedgerView {
    chart: ChartOfAccounts,
    entries: Vec<JournalEntry>,
    as_of: NaiveDate,
    period: PeriodKey,
}

impl LedgerView {
    fn balance(&self, accounts: &[AccountId]) -> Decimal {
        let balances = ReportService::balances_as_of(&self.chart, &self.entries, self.as_of);
        accounts.iter().filter_map(|id| balances.get(id)).copied().sum()
    }

    fn label(&self, dimension: &Dimension) -> String {
        match dimension {
            Dimension::Account(id) => self
                .chart
                .get(*id)
                .map_or_else(|| dimension.to_string(), |a| format!("{} {}", a.code, a.name)),
            Dimension::Group(name) => name.clone(),
        }
    }

    fn activity(&self, period: PeriodKey, accounts: &[AccountId]) -> Decimal {
        let wanted: HashSet<AccountId> = accounts.iter().copied().collect();
        self.entries
            .iter()
            .filter(|e| e.period() == period)
            .flat_map(JournalEntry::lines)
            .filter(|line| wanted.contains(&line.account_id))
            .filter_map(|line| {
                self.chart
                    .get(line.account_id)
                    .map(|a| a.normal_balance().signed(line.debit, line.credit))
            })
            .sum()
    }
}

/// Evaluates alert rules and hands fired alerts to the dispatcher.
pub struct AlertEvaluator<S, D> {
    store: Arc<S>,
    dispatcher: Arc<D>,
    trend_periods: u32,
}

impl<S, D> Clone for AlertEvaluator<S, D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            dispatcher: Arc::clone(&self.dispatcher),
            trend_periods: self.trend_periods,
        }
    }
}

impl<S, D> AlertEvaluator<S, D>
where
    S: TenantStore + LedgerStore + VarianceStore + AlertStore,
    D: NotificationDispatcher,
{
    /// Creates an evaluator. Trend rules inspect `trend_periods` months.
    #[must_use]
    pub const fn new(store: Arc<S>, dispatcher: Arc<D>, trend_periods: u32) -> Self {
        Self {
            store,
            dispatcher,
            trend_periods,
        }
    }

    /// Evaluates every active rule as of today in the tenant's timezone.
    pub async fn check_all_alerts(&self, tenant_id: TenantId) -> Result<AlertCheckReport, AlertError> {
        let tenant = self
            .store
            .tenant(tenant_id)
            .await?
            .ok_or(AlertError::TenantNotFound(tenant_id))?;
        self.check_alerts_as_of(tenant_id, tenant.today()).await
    }

    /// Evaluates every active rule against the ledger as of the end of `as_of`.
    #[instrument(name = "check_all_alerts", skip_all, fields(tenant_id = %tenant_id, as_of = %as_of))]
    pub async fn check_alerts_as_of(
        &self,
        tenant_id: TenantId,
        as_of: NaiveDate,
    ) -> Result<AlertCheckReport, AlertError> {
        self.store
            .tenant(tenant_id)
            .await?
            .ok_or(AlertError::TenantNotFound(tenant_id))?;

        let rules: Vec<AlertRule> = self
            .store
            .active_alert_rules(tenant_id)
            .await?
            .into_iter()
            .filter(|r| r.is_active && r.tenant_id == tenant_id)
            .collect();

        let mut report = AlertCheckReport {
            tenant_id,
            evaluated: rules.len(),
            triggered: Vec::new(),
            failures: Vec::new(),
            dispatch_failures: Vec::new(),
        };
        if rules.is_empty() {
            return Ok(report);
        }

        let view = LedgerView {
            chart: ChartOfAccounts::for_tenant(tenant_id, self.store.accounts(tenant_id).await?),
            entries: self
                .store
                .entries_between(tenant_id, NaiveDate::MIN, as_of)
                .await?,
            as_of,
            period: PeriodKey::containing(tenant_id, as_of),
        };

        for rule in &rules {
            match self.evaluate(rule, &view).await {
                Ok(Some((observed, message))) => self.fire(rule, observed, message, &mut report).await,
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        rule_id = %rule.id,
                        error_code = err.error_code(),
                        error = %err,
                        "alert rule evaluation failed"
                    );
                    report.failures.push(AlertFailure {
                        rule_id: rule.id,
                        rule_name: rule.name.clone(),
                        error_code: err.error_code(),
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            evaluated = report.evaluated,
            triggered = report.triggered.len(),
            failed = report.failures.len(),
            dispatch_failed = report.dispatch_failures.len(),
            "alert check finished"
        );
        Ok(report)
    }

    /// The observed value and message when the rule fires.
    async fn evaluate(
        &self,
        rule: &AlertRule,
        view: &LedgerView,
    ) -> Result<Option<(Decimal, String)>, AlertError> {
        let condition = rule.resolve(self.trend_periods)?;
        let observed = self.observe(rule, &condition, view).await?;
        if !condition.test.fires(observed) {
            return Ok(None);
        }
        let message = format!(
            "{}: {} of {} is {} ({})",
            rule.name,
            condition.measure,
            view.label(&condition.dimension),
            observed,
            condition.test
        );
        Ok(Some((observed, message)))
    }

    async fn observe(
        &self,
        rule: &AlertRule,
        condition: &AlertCondition,
        view: &LedgerView,
    ) -> Result<Decimal, AlertError> {
        let missing = |reason: String| AlertError::MissingData {
            rule_id: rule.id,
            reason,
        };
        let dimension = &condition.dimension;
        let (accounts, _) = dimension
            .resolve(&view.chart)
            .ok_or_else(|| missing(format!("{dimension} does not exist")))?;
        let period = view.period;

        match condition.measure {
            Measure::Balance => Ok(view.balance(&accounts)),
            Measure::MonthOverMonth => {
                let previous = period
                    .previous()
                    .ok_or_else(|| missing("no previous month".to_string()))?;
                deviation_pct(view.activity(period, &accounts), view.activity(previous, &accounts))
                    .ok_or_else(|| missing(format!("no activity in {previous}")))
            }
            Measure::Trend { periods } => {
                let window = period.trailing(periods.saturating_sub(1));
                let oldest = window
                    .first()
                    .copied()
                    .filter(|_| window.len() + 1 == periods as usize)
                    .ok_or_else(|| missing(format!("fewer than {periods} months available")))?;
                deviation_pct(view.activity(period, &accounts), view.activity(oldest, &accounts))
                    .ok_or_else(|| missing(format!("no activity in {oldest}")))
            }
            Measure::VarianceDeviation => {
                let record = self
                    .store
                    .variance_record(period, dimension)
                    .await?
                    .ok_or_else(|| missing(format!("no variance computed for {period}")))?;
                record
                    .deviation_pct
                    .ok_or_else(|| missing(format!("variance baseline for {period} is zero")))
            }
        }
    }

    async fn fire(
        &self,
        rule: &AlertRule,
        observed_value: Decimal,
        message: String,
        report: &mut AlertCheckReport,
    ) {
        let mut event = AlertEvent {
            id: AlertEventId::new(),
            rule_id: rule.id,
            tenant_id: rule.tenant_id,
            triggered_at: Utc::now(),
            observed_value,
            message,
            dispatched: false,
        };
        if let Err(err) = self.store.append_alert_event(event.clone()).await {
            let err = AlertError::from(err);
            warn!(rule_id = %rule.id, error = %err, "failed to record alert event");
            report.failures.push(AlertFailure {
                rule_id: rule.id,
                rule_name: rule.name.clone(),
                error_code: err.error_code(),
                message: err.to_string(),
            });
            return;
        }
        info!(rule_id = %rule.id, event_id = %event.id, observed = %observed_value, "alert triggered");

        if !rule.notify_channels.is_empty() {
            let request = DispatchRequest {
                tenant_id: rule.tenant_id,
                event_id: event.id,
                channels: rule.notify_channels.clone(),
                subject: format!("Alert: {}", rule.name),
                message: event.message.clone(),
            };
            let dispatched = match self.dispatcher.enqueue(request).await {
                Ok(()) => self
                    .store
                    .mark_alert_dispatched(rule.tenant_id, event.id)
                    .await
                    .map_err(|err| err.to_string()),
                Err(err) => Err(err.to_string()),
            };
            match dispatched {
                Ok(()) => event.dispatched = true,
                Err(message) => {
                    warn!(rule_id = %rule.id, event_id = %event.id, error = %message, "alert dispatch failed");
                    report.dispatch_failures.push(DispatchFailure {
                        rule_id: rule.id,
                        event_id: event.id,
                        message,
                    });
                }
            }
        }

        report.triggered.push(event);
    }
}
