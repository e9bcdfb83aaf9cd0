//! Double-entry ledger and the sync engine that feeds it.
//!
//! - Chart of accounts and account classification
//! - Accounting periods and their sync lock states
//! - Source documents and the fixed mapping table
//! - Balanced journal entries
//! - Balance accumulation
//! - Idempotent, per-period exclusive ledger sync

pub mod balance;
pub mod chart;
pub mod entry;
pub mod error;
pub mod mapping;
pub mod period;
pub mod source;
pub mod sync;
pub mod types;

#[cfg(test)]
mod mapping_props;

pub use balance::{AccountBalance, accumulate};
pub use chart::ChartOfAccounts;
pub use entry::{JournalEntry, JournalLine, NewJournalEntry};
pub use error::LedgerError;
pub use mapping::{EntryMapper, codes, expense_account_code};
pub use period::{MAX_TRAILING_PERIODS, Period, PeriodKey, PeriodStatus, PeriodTransition};
pub use source::{
    ChargeStatus, DocumentStatus, ExpenseStatus, InvoiceStatus, SourceDetail, SourceKey,
    SourceTransaction, SourceType,
};
pub use sync::{LedgerSyncService, SyncFailure, SyncOptions, SyncReport};
pub use types::{AccountSubtype, AccountType, LedgerAccount, NormalBalance};
