//! Concurrent in-memory store.
//!
//! Backs the runner and the integration tests. Every conditional write
//! (period acquisition, entry posting) happens under one `DashMap` shard lock,
//! so concurrent callers see the same exclusivity a relational store gives
//! with a conditional `UPDATE` and a unique index.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use ledgerline_core::Tenant;
use ledgerline_core::alerts::{AlertEvent, AlertRule};
use ledgerline_core::ledger::{
    ChartOfAccounts, JournalEntry, LedgerAccount, Period, PeriodKey, PeriodStatus,
    PeriodTransition, SourceKey, SourceTransaction,
};
use ledgerline_core::store::{
    AlertStore, LedgerStore, PostOutcome, StoreError, TenantStore, VarianceStore,
};
use ledgerline_core::variance::{Dimension, VarianceRecord, VarianceSettings};
use ledgerline_shared::types::{AlertEventId, TenantId};
use rust_decimal::Decimal;
use tracing::debug;

use crate::snapshot::Snapshot;

/// Posted entries of one tenant.
#[derive(Debug, Default)]
struct TenantLedger {
    entries: Vec<JournalEntry>,
    keys: HashSet<SourceKey>,
    version: u64,
}

/// In-memory implementation of every store trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tenants: DashMap<TenantId, Tenant>,
    accounts: DashMap<TenantId, Vec<LedgerAccount>>,
    chart_versions: DashMap<TenantId, u64>,
    transactions: DashMap<TenantId, Vec<SourceTransaction>>,
    periods: DashMap<PeriodKey, Period>,
    ledgers: DashMap<TenantId, TenantLedger>,
    variance_settings: DashMap<TenantId, VarianceSettings>,
    budgets: DashMap<(PeriodKey, Dimension), Decimal>,
    variances: DashMap<(PeriodKey, Dimension), VarianceRecord>,
    alert_rules: DashMap<TenantId, Vec<AlertRule>>,
    alert_events: DashMap<TenantId, Vec<AlertEvent>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a snapshot.
    ///
    /// Tenants listed without accounts get the standard chart.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::new();
        for tenant in snapshot.tenants {
            store.insert_tenant(tenant);
        }
        let mut charts: HashMap<TenantId, Vec<LedgerAccount>> = HashMap::new();
        for account in snapshot.accounts {
            charts.entry(account.tenant_id).or_default().push(account);
        }
        for (tenant_id, accounts) in charts {
            store.set_accounts(tenant_id, accounts);
        }
        let without_chart: Vec<TenantId> = store
            .tenants
            .iter()
            .map(|t| *t.key())
            .filter(|id| !store.accounts.contains_key(id))
            .collect();
        for tenant_id in without_chart {
            store.provision_standard_chart(tenant_id);
        }
        for txn in snapshot.source_transactions {
            store.add_source_transaction(txn);
        }
        for period in snapshot.periods {
            store.periods.insert(period.key, period);
        }
        for seed in snapshot.variance_settings {
            store.set_variance_settings(seed.tenant_id, seed.settings);
        }
        for budget in snapshot.budgets {
            if let Ok(period) = PeriodKey::new(budget.tenant_id, budget.year, budget.month) {
                store.set_budget(period, budget.dimension, budget.amount);
            }
        }
        for rule in snapshot.alert_rules {
            store.add_alert_rule(rule);
        }
        store
    }

    /// Adds or replaces a tenant.
    pub fn insert_tenant(&self, tenant: Tenant) {
        self.tenants.insert(tenant.id, tenant);
    }

    /// Replaces a tenant's chart of accounts.
    ///
    /// Accounts owned by another tenant are dropped.
    pub fn set_accounts(&self, tenant_id: TenantId, mut accounts: Vec<LedgerAccount>) {
        accounts.retain(|a| a.tenant_id == tenant_id);
        self.accounts.insert(tenant_id, accounts);
        *self.chart_versions.entry(tenant_id).or_insert(0) += 1;
    }

    /// Installs [`ChartOfAccounts::standard`] and returns it.
    pub fn provision_standard_chart(&self, tenant_id: TenantId) -> ChartOfAccounts {
        let chart = ChartOfAccounts::standard(tenant_id);
        self.set_accounts(tenant_id, chart.accounts().to_vec());
        chart
    }

    /// Records a source document.
    pub fn add_source_transaction(&self, txn: SourceTransaction) {
        self.transactions.entry(txn.tenant_id).or_default().push(txn);
    }

    /// Overwrites a period record.
    pub fn set_period(&self, period: Period) {
        self.periods.insert(period.key, period);
    }

    /// Sets a tenant's variance configuration.
    pub fn set_variance_settings(&self, tenant_id: TenantId, settings: VarianceSettings) {
        self.variance_settings.insert(tenant_id, settings);
    }

    /// Sets the budget of a dimension for a period.
    pub fn set_budget(&self, period: PeriodKey, dimension: Dimension, amount: Decimal) {
        self.budgets.insert((period, dimension), amount);
    }

    /// Adds an alert rule.
    pub fn add_alert_rule(&self, rule: AlertRule) {
        self.alert_rules.entry(rule.tenant_id).or_default().push(rule);
    }

    /// Every posted entry of a tenant, in posting order.
    #[must_use]
    pub fn journal_entries(&self, tenant_id: TenantId) -> Vec<JournalEntry> {
        self.ledgers
            .get(&tenant_id)
            .map(|ledger| ledger.entries.clone())
            .unwrap_or_default()
    }

    /// Every alert event of a tenant, oldest first.
    #[must_use]
    pub fn alert_events(&self, tenant_id: TenantId) -> Vec<AlertEvent> {
        self.alert_events
            .get(&tenant_id)
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TenantStore for MemoryStore {
    async fn tenant(&self, tenant_id: TenantId) -> Result<Option<Tenant>, StoreError> {
        Ok(self.tenants.get(&tenant_id).map(|t| t.clone()))
    }

    async fn active_tenants(&self) -> Result<Vec<Tenant>, StoreError> {
        let mut tenants: Vec<Tenant> = self
            .tenants
            .iter()
            .filter(|t| t.is_active)
            .map(|t| t.clone())
            .collect();
        tenants.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(tenants)
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn accounts(&self, tenant_id: TenantId) -> Result<Vec<LedgerAccount>, StoreError> {
        Ok(self
            .accounts
            .get(&tenant_id)
            .map(|accounts| accounts.clone())
            .unwrap_or_default())
    }

    async fn period(&self, key: PeriodKey) -> Result<Option<Period>, StoreError> {
        Ok(self.periods.get(&key).map(|p| p.clone()))
    }

    async fn begin_sync(&self, key: PeriodKey) -> Result<PeriodTransition, StoreError> {
        let mut period = self.periods.entry(key).or_insert_with(|| Period::open(key));
        let transition = match period.status {
            PeriodStatus::Open => {
                period.status = PeriodStatus::Syncing;
                PeriodTransition::Acquired
            }
            PeriodStatus::Syncing => PeriodTransition::AlreadySyncing,
            PeriodStatus::Closed => PeriodTransition::Closed,
        };
        debug!(period = %key, ?transition, "begin sync");
        Ok(transition)
    }

    async fn finish_sync(
        &self,
        key: PeriodKey,
        status: PeriodStatus,
        synced_at: DateTime<Utc>,
    ) -> Result<Period, StoreError> {
        let mut period = self
            .periods
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound(format!("period {key}")))?;
        if period.status != PeriodStatus::Syncing {
            return Err(StoreError::Conflict(format!("period {key} is not syncing")));
        }
        period.status = status;
        period.last_synced_at = Some(synced_at);
        Ok(period.clone())
    }

    async fn source_transactions(
        &self,
        tenant_id: TenantId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<SourceTransaction>, StoreError> {
        Ok(self
            .transactions
            .get(&tenant_id)
            .map(|txns| {
                txns.iter()
                    .filter(|t| t.occurred_at >= from && t.occurred_at < until)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn existing_source_keys(
        &self,
        tenant_id: TenantId,
        keys: &[SourceKey],
    ) -> Result<HashSet<SourceKey>, StoreError> {
        Ok(self
            .ledgers
            .get(&tenant_id)
            .map(|ledger| {
                keys.iter()
                    .filter(|k| ledger.keys.contains(k))
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn post_entry(&self, entry: JournalEntry) -> Result<PostOutcome, StoreError> {
        let period = entry.period();
        if self
            .periods
            .get(&period)
            .is_some_and(|p| p.status == PeriodStatus::Closed)
        {
            return Err(StoreError::Conflict(format!("period {period} is closed")));
        }

        {
            let accounts = self.accounts.get(&entry.tenant_id());
            let known = |id| {
                accounts
                    .as_ref()
                    .is_some_and(|chart| chart.iter().any(|a| a.id == id))
            };
            if let Some(line) = entry.lines().iter().find(|l| !known(l.account_id)) {
                return Err(StoreError::NotFound(format!(
                    "account {} in chart of tenant {}",
                    line.account_id,
                    entry.tenant_id()
                )));
            }
        }

        let mut ledger = self.ledgers.entry(entry.tenant_id()).or_default();
        if !ledger.keys.insert(entry.source_key()) {
            return Ok(PostOutcome::Duplicate);
        }
        ledger.entries.push(entry);
        ledger.version += 1;
        Ok(PostOutcome::Posted)
    }

    async fn entries_between(
        &self,
        tenant_id: TenantId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        let mut entries: Vec<JournalEntry> = self
            .ledgers
            .get(&tenant_id)
            .map(|ledger| {
                ledger
                    .entries
                    .iter()
                    .filter(|e| e.entry_date() >= start && e.entry_date() <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by_key(|e| (e.entry_date(), e.posted_at()));
        Ok(entries)
    }

    async fn ledger_version(&self, tenant_id: TenantId) -> Result<u64, StoreError> {
        Ok(self.ledgers.get(&tenant_id).map_or(0, |l| l.version))
    }

    async fn chart_version(&self, tenant_id: TenantId) -> Result<u64, StoreError> {
        Ok(self.chart_versions.get(&tenant_id).map_or(0, |v| *v))
    }
}

#[async_trait]
impl VarianceStore for MemoryStore {
    async fn variance_settings(
        &self,
        tenant_id: TenantId,
    ) -> Result<Option<VarianceSettings>, StoreError> {
        Ok(self.variance_settings.get(&tenant_id).map(|s| s.clone()))
    }

    async fn budget_amount(
        &self,
        period: PeriodKey,
        dimension: &Dimension,
    ) -> Result<Option<Decimal>, StoreError> {
        Ok(self
            .budgets
            .get(&(period, dimension.clone()))
            .map(|amount| *amount))
    }

    async fn upsert_variance(&self, record: VarianceRecord) -> Result<(), StoreError> {
        self.variances
            .insert((record.period, record.dimension.clone()), record);
        Ok(())
    }

    async fn variance_record(
        &self,
        period: PeriodKey,
        dimension: &Dimension,
    ) -> Result<Option<VarianceRecord>, StoreError> {
        Ok(self
            .variances
            .get(&(period, dimension.clone()))
            .map(|r| r.clone()))
    }

    async fn variance_records(&self, period: PeriodKey) -> Result<Vec<VarianceRecord>, StoreError> {
        let mut records: Vec<VarianceRecord> = self
            .variances
            .iter()
            .filter(|r| r.key().0 == period)
            .map(|r| r.value().clone())
            .collect();
        records.sort_by(|a, b| a.dimension.cmp(&b.dimension));
        Ok(records)
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn active_alert_rules(&self, tenant_id: TenantId) -> Result<Vec<AlertRule>, StoreError> {
        Ok(self
            .alert_rules
            .get(&tenant_id)
            .map(|rules| rules.iter().filter(|r| r.is_active).cloned().collect())
            .unwrap_or_default())
    }

    async fn append_alert_event(&self, event: AlertEvent) -> Result<(), StoreError> {
        self.alert_events
            .entry(event.tenant_id)
            .or_default()
            .push(event);
        Ok(())
    }

    async fn mark_alert_dispatched(
        &self,
        tenant_id: TenantId,
        event_id: AlertEventId,
    ) -> Result<(), StoreError> {
        let mut events = self
            .alert_events
            .get_mut(&tenant_id)
            .ok_or_else(|| StoreError::NotFound(format!("alert event {event_id}")))?;
        let event = events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| StoreError::NotFound(format!("alert event {event_id}")))?;
        event.dispatched = true;
        Ok(())
    }
}
