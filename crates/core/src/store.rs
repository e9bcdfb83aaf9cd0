//! Persistence and notification boundaries.
//!
//! The engines never talk to a database directly. Every read and write goes
//! through these traits so the relational store (or the in-memory store used
//! by the runner and tests) stays an external collaborator.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use ledgerline_shared::types::{AlertEventId, TenantId};
use ledgerline_shared::{AppError, ErrorKind};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::alerts::{AlertEvent, AlertRule, DispatchRequest};
use crate::ledger::{
    JournalEntry, LedgerAccount, Period, PeriodKey, PeriodStatus, PeriodTransition, SourceKey,
    SourceTransaction,
};
use crate::tenant::Tenant;
use crate::variance::{Dimension, VarianceRecord, VarianceSettings};

/// Errors surfaced by a store implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend failed (connection, timeout, serialization).
    #[error("Store backend error: {0}")]
    Backend(String),

    /// A conditional write lost a race or violated a uniqueness rule.
    #[error("Store conflict: {0}")]
    Conflict(String),

    /// A referenced row does not exist.
    #[error("Store record not found: {0}")]
    NotFound(String),
}

impl StoreError {
    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Backend(_) => ErrorKind::Internal,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Backend(_) => 500,
            Self::Conflict(_) => 409,
            Self::NotFound(_) => 404,
        }
    }

    /// Backend hiccups and lost races may succeed on retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::Conflict(_))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Backend(msg) => Self::Store(msg),
            StoreError::Conflict(_) => Self::Conflict(err.to_string()),
            StoreError::NotFound(_) => Self::NotFound(err.to_string()),
        }
    }
}

/// Result of posting one journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    /// All lines were written.
    Posted,
    /// An entry with the same source key already exists; nothing was written.
    Duplicate,
}

/// Tenant metadata.
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Looks up one tenant.
    async fn tenant(&self, tenant_id: TenantId) -> Result<Option<Tenant>, StoreError>;

    /// Lists tenants the scheduler should process.
    async fn active_tenants(&self) -> Result<Vec<Tenant>, StoreError>;
}

/// Chart of accounts, periods, source transactions and journal entries.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Chart of accounts of a tenant.
    async fn accounts(&self, tenant_id: TenantId) -> Result<Vec<LedgerAccount>, StoreError>;

    /// Period record, if the period was ever synced.
    async fn period(&self, key: PeriodKey) -> Result<Option<Period>, StoreError>;

    /// Conditionally moves a period from open to syncing.
    ///
    /// Creates the period (open) first if it does not exist. Exactly one of
    /// several concurrent callers observes [`PeriodTransition::Acquired`].
    async fn begin_sync(&self, key: PeriodKey) -> Result<PeriodTransition, StoreError>;

    /// Releases a syncing period into `status` and records the sync instant.
    async fn finish_sync(
        &self,
        key: PeriodKey,
        status: PeriodStatus,
        synced_at: DateTime<Utc>,
    ) -> Result<Period, StoreError>;

    /// Source transactions with `from <= occurred_at < until`.
    async fn source_transactions(
        &self,
        tenant_id: TenantId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<SourceTransaction>, StoreError>;

    /// The subset of `keys` that already have a journal entry.
    async fn existing_source_keys(
        &self,
        tenant_id: TenantId,
        keys: &[SourceKey],
    ) -> Result<HashSet<SourceKey>, StoreError>;

    /// Writes one entry atomically: all of its lines or none.
    ///
    /// Fails with [`StoreError::NotFound`] when a line references an account
    /// that is not in the entry tenant's chart.
    async fn post_entry(&self, entry: JournalEntry) -> Result<PostOutcome, StoreError>;

    /// Entries whose entry date lies in `[start, end]`.
    async fn entries_between(
        &self,
        tenant_id: TenantId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<JournalEntry>, StoreError>;

    /// Counter bumped by every committed entry of the tenant.
    async fn ledger_version(&self, tenant_id: TenantId) -> Result<u64, StoreError>;

    /// Counter bumped by every change to the tenant's chart of accounts.
    async fn chart_version(&self, tenant_id: TenantId) -> Result<u64, StoreError>;
}

/// Budgets, variance settings and variance results.
#[async_trait]
pub trait VarianceStore: Send + Sync {
    /// Tenant-specific bands and tracked dimensions.
    async fn variance_settings(
        &self,
        tenant_id: TenantId,
    ) -> Result<Option<VarianceSettings>, StoreError>;

    /// Configured budget for a dimension in a period.
    async fn budget_amount(
        &self,
        period: PeriodKey,
        dimension: &Dimension,
    ) -> Result<Option<Decimal>, StoreError>;

    /// Inserts or replaces the record keyed by `(tenant, period, dimension)`.
    async fn upsert_variance(&self, record: VarianceRecord) -> Result<(), StoreError>;

    /// Stored record for one dimension.
    async fn variance_record(
        &self,
        period: PeriodKey,
        dimension: &Dimension,
    ) -> Result<Option<VarianceRecord>, StoreError>;

    /// Every stored record of a period.
    async fn variance_records(&self, period: PeriodKey) -> Result<Vec<VarianceRecord>, StoreError>;
}

/// Alert rules and the append-only alert event log.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Active rules of a tenant.
    async fn active_alert_rules(&self, tenant_id: TenantId) -> Result<Vec<AlertRule>, StoreError>;

    /// Appends a fired event.
    async fn append_alert_event(&self, event: AlertEvent) -> Result<(), StoreError>;

    /// Flags an event as handed to the dispatcher.
    async fn mark_alert_dispatched(
        &self,
        tenant_id: TenantId,
        event_id: AlertEventId,
    ) -> Result<(), StoreError>;
}

/// Failure handing a notification to the delivery system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The delivery system refused the payload.
    #[error("Dispatch rejected: {0}")]
    Rejected(String),

    /// The delivery system could not be reached.
    #[error("Dispatcher unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification queue. Delivery itself happens elsewhere.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Enqueues one notification.
    async fn enqueue(&self, request: DispatchRequest) -> Result<(), DispatchError>;
}
