//! Balanced journal entries.
//!
//! A [`JournalEntry`] can only exist in a balanced state: construction
//! validates the lines and deserialization goes through the same check.

use chrono::{DateTime, NaiveDate, Utc};
use ledgerline_shared::types::{AccountId, JournalEntryId, SourceId, TenantId, checked_sum};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::period::PeriodKey;
use super::source::{SourceKey, SourceType};

/// One debit or credit line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Account posted to.
    pub account_id: AccountId,
    /// Debit amount (zero on credit lines).
    pub debit: Decimal,
    /// Credit amount (zero on debit lines).
    pub credit: Decimal,
}

impl JournalLine {
    /// A debit line.
    #[must_use]
    pub const fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
        }
    }

    /// A credit line.
    #[must_use]
    pub const fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
        }
    }

    fn validate(&self) -> Result<(), LedgerError> {
        if self.debit < Decimal::ZERO || self.credit < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount);
        }
        // exactly one side carries an amount
        if self.debit.is_zero() == self.credit.is_zero() {
            return Err(LedgerError::InvalidLine);
        }
        Ok(())
    }
}

/// Input for [`JournalEntry::new`].
#[derive(Debug, Clone)]
pub struct NewJournalEntry {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Source document kind.
    pub source_type: SourceType,
    /// Source document ID.
    pub source_id: SourceId,
    /// Accounting date (tenant-local).
    pub entry_date: NaiveDate,
    /// Free-text description.
    pub memo: String,
    /// Ordered lines.
    pub lines: Vec<JournalLine>,
}

/// A balanced, immutable double-entry record derived from one source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "JournalEntryRecord", into = "JournalEntryRecord")]
pub struct JournalEntry {
    id: JournalEntryId,
    tenant_id: TenantId,
    source_type: SourceType,
    source_id: SourceId,
    entry_date: NaiveDate,
    posted_at: DateTime<Utc>,
    memo: String,
    lines: Vec<JournalLine>,
}

/// Serialized form; converted back through validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct JournalEntryRecord {
    id: JournalEntryId,
    tenant_id: TenantId,
    source_type: SourceType,
    source_id: SourceId,
    period_year: i32,
    period_month: u32,
    entry_date: NaiveDate,
    posted_at: DateTime<Utc>,
    #[serde(default)]
    memo: String,
    lines: Vec<JournalLine>,
}

impl TryFrom<JournalEntryRecord> for JournalEntry {
    type Error = LedgerError;

    fn try_from(record: JournalEntryRecord) -> Result<Self, Self::Error> {
        let mut entry = Self::new(
            NewJournalEntry {
                tenant_id: record.tenant_id,
                source_type: record.source_type,
                source_id: record.source_id,
                entry_date: record.entry_date,
                memo: record.memo,
                lines: record.lines,
            },
            record.posted_at,
        )?;
        let period = entry.period();
        if period.year() != record.period_year || period.month() != record.period_month {
            return Err(LedgerError::InvalidPeriod {
                year: record.period_year,
                month: record.period_month,
            });
        }
        entry.id = record.id;
        Ok(entry)
    }
}

impl From<JournalEntry> for JournalEntryRecord {
    fn from(entry: JournalEntry) -> Self {
        let period = entry.period();
        Self {
            id: entry.id,
            tenant_id: entry.tenant_id,
            source_type: entry.source_type,
            source_id: entry.source_id,
            period_year: period.year(),
            period_month: period.month(),
            entry_date: entry.entry_date,
            posted_at: entry.posted_at,
            memo: entry.memo,
            lines: entry.lines,
        }
    }
}

impl JournalEntry {
    /// Validates and builds an entry.
    ///
    /// Fails unless there are at least two lines, every line carries exactly
    /// one non-negative side, and total debits equal total credits. Totals
    /// that overflow fail with [`LedgerError::AmountOverflow`].
    pub fn new(input: NewJournalEntry, posted_at: DateTime<Utc>) -> Result<Self, LedgerError> {
        if input.lines.len() < 2 {
            return Err(LedgerError::InsufficientLines);
        }
        for line in &input.lines {
            line.validate()?;
        }

        let debit = checked_sum(input.lines.iter().map(|l| l.debit))
            .map_err(|_| LedgerError::AmountOverflow("entry debits"))?;
        let credit = checked_sum(input.lines.iter().map(|l| l.credit))
            .map_err(|_| LedgerError::AmountOverflow("entry credits"))?;
        if debit != credit {
            return Err(LedgerError::UnbalancedEntry { debit, credit });
        }

        Ok(Self {
            id: JournalEntryId::new(),
            tenant_id: input.tenant_id,
            source_type: input.source_type,
            source_id: input.source_id,
            entry_date: input.entry_date,
            posted_at,
            memo: input.memo,
            lines: input.lines,
        })
    }

    /// Entry ID.
    #[must_use]
    pub const fn id(&self) -> JournalEntryId {
        self.id
    }

    /// Owning tenant.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Idempotence key.
    #[must_use]
    pub const fn source_key(&self) -> SourceKey {
        SourceKey {
            tenant_id: self.tenant_id,
            source_type: self.source_type,
            source_id: self.source_id,
        }
    }

    /// Accounting date.
    #[must_use]
    pub const fn entry_date(&self) -> NaiveDate {
        self.entry_date
    }

    /// Period the entry belongs to.
    #[must_use]
    pub fn period(&self) -> PeriodKey {
        PeriodKey::containing(self.tenant_id, self.entry_date)
    }

    /// When the entry was built for posting.
    #[must_use]
    pub const fn posted_at(&self) -> DateTime<Utc> {
        self.posted_at
    }

    /// Description.
    #[must_use]
    pub fn memo(&self) -> &str {
        &self.memo
    }

    /// Ordered lines.
    #[must_use]
    pub fn lines(&self) -> &[JournalLine] {
        &self.lines
    }

    /// Sum of debits (equal to the sum of credits).
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit).sum()
    }
}
