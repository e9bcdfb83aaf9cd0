//! Ledger sync: turns a period's source documents into journal entries.
//!
//! A sync holds the period exclusively (open → syncing), posts one entry per
//! unsynced postable document and releases the period even when the batch
//! fails part way. Posting is idempotent on `(tenant, source_type, source_id)`.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use ledgerline_shared::types::{SourceId, TenantId};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::chart::ChartOfAccounts;
use super::error::LedgerError;
use super::mapping::EntryMapper;
use super::period::{PeriodKey, PeriodStatus, PeriodTransition};
use super::source::{SourceKey, SourceTransaction, SourceType};
use crate::store::{LedgerStore, PostOutcome, TenantStore};
use crate::tenant::Tenant;

/// Caller options for one sync.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Close the period when the batch finishes without failures.
    pub close_on_sync: bool,
    /// Aborts the batch between entries when cancelled.
    pub cancel: Option<CancellationToken>,
}

/// One document that could not be posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    /// Document kind.
    pub source_type: SourceType,
    /// Document ID.
    pub source_id: SourceId,
    /// Human reference.
    pub reference: String,
    /// Stable error code.
    pub error_code: &'static str,
    /// Error message.
    pub message: String,
}

/// Outcome of a sync call.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// Tenant synced.
    pub tenant_id: TenantId,
    /// Period synced.
    pub period: PeriodKey,
    /// Entries written by this call.
    pub posted: usize,
    /// Documents that already had an entry.
    pub skipped_existing: usize,
    /// Documents in the range whose status does not allow posting.
    pub ineligible: usize,
    /// Documents that failed to map or post.
    pub failures: Vec<SyncFailure>,
    /// Whether the batch stopped early on cancellation.
    pub cancelled: bool,
    /// Status the period was released into.
    pub final_status: PeriodStatus,
    /// Release instant.
    pub synced_at: DateTime<Utc>,
}

impl SyncReport {
    /// The call completed but some documents were not posted.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Debug, Default)]
struct BatchOutcome {
    posted: usize,
    skipped_existing: usize,
    ineligible: usize,
    failures: Vec<SyncFailure>,
    cancelled: bool,
}

/// Runs ledger syncs against a store.
#[derive(Debug)]
pub struct LedgerSyncService<S> {
    store: Arc<S>,
}

impl<S> Clone for LedgerSyncService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> LedgerSyncService<S>
where
    S: TenantStore + LedgerStore,
{
    /// Creates a sync service over a store handle.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Syncs source documents effective in `[period_start, period_end]`
    /// (tenant-local dates inside the given month) into the ledger.
    ///
    /// Fails fast with [`LedgerError::SyncInProgress`] when another sync holds
    /// the period and with [`LedgerError::PeriodClosed`] when it is closed.
    /// Per-document failures do not abort the batch; they are listed in the
    /// report and the period stays open so a later call can retry them.
    #[instrument(
        name = "sync_period",
        skip_all,
        fields(tenant_id = %tenant_id, year = year, month = month)
    )]
    pub async fn sync_period(
        &self,
        tenant_id: TenantId,
        year: i32,
        month: u32,
        period_start: NaiveDate,
        period_end: NaiveDate,
        options: &SyncOptions,
    ) -> Result<SyncReport, LedgerError> {
        let key = PeriodKey::new(tenant_id, year, month)?;
        if period_start > period_end || !key.contains(period_start) || !key.contains(period_end) {
            return Err(LedgerError::InvalidDateRange {
                start: period_start,
                end: period_end,
            });
        }

        let tenant = self
            .store
            .tenant(tenant_id)
            .await?
            .ok_or(LedgerError::TenantNotFound(tenant_id))?;

        match self.store.begin_sync(key).await? {
            PeriodTransition::Acquired => {}
            PeriodTransition::AlreadySyncing => {
                info!(period = %key, "period already syncing, skipping");
                return Err(LedgerError::SyncInProgress(key.label()));
            }
            PeriodTransition::Closed => return Err(LedgerError::PeriodClosed(key.label())),
        }

        let outcome = self
            .run_batch(&tenant, period_start, period_end, options)
            .await;

        let final_status = match &outcome {
            Ok(batch)
                if options.close_on_sync && batch.failures.is_empty() && !batch.cancelled =>
            {
                PeriodStatus::Closed
            }
            _ => PeriodStatus::Open,
        };
        let synced_at = Utc::now();
        let released = self.store.finish_sync(key, final_status, synced_at).await;

        let batch = outcome?;
        released?;

        info!(
            period = %key,
            posted = batch.posted,
            skipped_existing = batch.skipped_existing,
            ineligible = batch.ineligible,
            failed = batch.failures.len(),
            cancelled = batch.cancelled,
            "ledger sync finished"
        );

        Ok(SyncReport {
            tenant_id,
            period: key,
            posted: batch.posted,
            skipped_existing: batch.skipped_existing,
            ineligible: batch.ineligible,
            failures: batch.failures,
            cancelled: batch.cancelled,
            final_status,
            synced_at,
        })
    }

    /// Syncs a whole calendar month.
    pub async fn sync_month(
        &self,
        tenant_id: TenantId,
        year: i32,
        month: u32,
        options: &SyncOptions,
    ) -> Result<SyncReport, LedgerError> {
        let key = PeriodKey::new(tenant_id, year, month)?;
        self.sync_period(tenant_id, year, month, key.first_day(), key.last_day(), options)
            .await
    }

    async fn run_batch(
        &self,
        tenant: &Tenant,
        start: NaiveDate,
        end: NaiveDate,
        options: &SyncOptions,
    ) -> Result<BatchOutcome, LedgerError> {
        let invalid_range = || LedgerError::InvalidDateRange { start, end };
        let from = tenant.start_of_day(start).ok_or_else(invalid_range)?;
        let until = end
            .succ_opt()
            .and_then(|next| tenant.start_of_day(next))
            .ok_or_else(invalid_range)?;

        let chart = ChartOfAccounts::for_tenant(tenant.id, self.store.accounts(tenant.id).await?);
        let mut transactions: Vec<SourceTransaction> = self
            .store
            .source_transactions(tenant.id, from, until)
            .await?
            .into_iter()
            .filter(|txn| txn.tenant_id == tenant.id)
            .collect();
        transactions.sort_by(|a, b| {
            a.occurred_at
                .cmp(&b.occurred_at)
                .then_with(|| a.key().cmp(&b.key()))
        });

        let mut outcome = BatchOutcome::default();
        let (postable, ineligible): (Vec<_>, Vec<_>) =
            transactions.into_iter().partition(SourceTransaction::is_postable);
        outcome.ineligible = ineligible.len();

        let keys: Vec<SourceKey> = postable.iter().map(SourceTransaction::key).collect();
        let mut existing: HashSet<SourceKey> =
            self.store.existing_source_keys(tenant.id, &keys).await?;

        let mapper = EntryMapper::new(&chart, tenant.timezone);
        for txn in &postable {
            if options
                .cancel
                .as_ref()
                .is_some_and(CancellationToken::is_cancelled)
            {
                info!(remaining = postable.len() - outcome.processed(), "sync cancelled");
                outcome.cancelled = true;
                break;
            }

            let key = txn.key();
            if existing.contains(&key) {
                outcome.skipped_existing += 1;
                continue;
            }

            let result = match mapper.map(txn, Utc::now()) {
                Ok(entry) => self.store.post_entry(entry).await.map_err(LedgerError::from),
                Err(err) => Err(err),
            };
            match result {
                Ok(PostOutcome::Posted) => {
                    outcome.posted += 1;
                    existing.insert(key);
                }
                Ok(PostOutcome::Duplicate) => {
                    outcome.skipped_existing += 1;
                    existing.insert(key);
                }
                Err(err) => {
                    warn!(
                        source_type = %txn.source_type(),
                        source_id = %txn.source_id,
                        error_code = err.error_code(),
                        error = %err,
                        "failed to post source transaction"
                    );
                    outcome.failures.push(SyncFailure {
                        source_type: txn.source_type(),
                        source_id: txn.source_id,
                        reference: txn.reference.clone(),
                        error_code: err.error_code(),
                        message: err.to_string(),
                    });
                }
            }
        }

        Ok(outcome)
    }
}

impl BatchOutcome {
    fn processed(&self) -> usize {
        self.posted + self.skipped_existing + self.failures.len()
    }
}
