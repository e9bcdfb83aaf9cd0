//! Fixed mapping from source documents to journal lines.
//!
//! | source | debit | credit |
//! |---|---|---|
//! | paid invoice | 101 Bank (total) | 401 Sales (subtotal), 210 Tax Payable (tax) |
//! | approved expense | category account | 101 Bank |
//! | posted payroll run | 601 Salaries (gross) | 101 Bank (net), 220 Payroll Liabilities (deductions) |
//! | posted purchase receipt | 510 COGS (amount), 150 Input Tax Credit (tax) | 201 Payables (amount + tax) |
//! | paid subscription charge | 101 Bank (total) | 402 Subscription Revenue, 210 Tax Payable |

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;

use super::chart::ChartOfAccounts;
use super::entry::{JournalEntry, JournalLine, NewJournalEntry};
use super::error::LedgerError;
use super::source::{SourceDetail, SourceTransaction};

/// Standard chart codes used by the mapping table.
pub mod codes {
    /// Bank (cash).
    pub const BANK: &str = "101";
    /// Accounts receivable.
    pub const ACCOUNTS_RECEIVABLE: &str = "120";
    /// Input tax credit.
    pub const INPUT_TAX_CREDIT: &str = "150";
    /// Accounts payable.
    pub const ACCOUNTS_PAYABLE: &str = "201";
    /// Output tax payable.
    pub const TAX_PAYABLE: &str = "210";
    /// Payroll deductions awaiting remittance.
    pub const PAYROLL_LIABILITIES: &str = "220";
    /// Owner's equity.
    pub const OWNER_EQUITY: &str = "301";
    /// Sales revenue.
    pub const SALES_REVENUE: &str = "401";
    /// Subscription revenue.
    pub const SUBSCRIPTION_REVENUE: &str = "402";
    /// Travel expense.
    pub const TRAVEL: &str = "501";
    /// Office expense.
    pub const OFFICE: &str = "502";
    /// Marketing expense.
    pub const MARKETING: &str = "503";
    /// Utilities expense.
    pub const UTILITIES: &str = "504";
    /// Rent expense.
    pub const RENT: &str = "505";
    /// Cost of goods sold.
    pub const COST_OF_GOODS_SOLD: &str = "510";
    /// Uncategorised expense.
    pub const OTHER_EXPENSE: &str = "599";
    /// Salaries and wages.
    pub const SALARIES: &str = "601";
}

/// Expense account code for a free-text category.
#[must_use]
pub fn expense_account_code(category: &str) -> &'static str {
    match category.trim().to_ascii_lowercase().as_str() {
        "travel" => codes::TRAVEL,
        "office" | "office supplies" => codes::OFFICE,
        "marketing" => codes::MARKETING,
        "utilities" => codes::UTILITIES,
        "rent" => codes::RENT,
        _ => codes::OTHER_EXPENSE,
    }
}

#[derive(Clone, Copy)]
enum Side {
    Debit,
    Credit,
}

/// Builds journal entries for one tenant's chart.
#[derive(Debug)]
pub struct EntryMapper<'a> {
    chart: &'a ChartOfAccounts,
    timezone: Tz,
}

impl<'a> EntryMapper<'a> {
    /// Creates a mapper over a chart; `timezone` fixes the entry date.
    #[must_use]
    pub const fn new(chart: &'a ChartOfAccounts, timezone: Tz) -> Self {
        Self { chart, timezone }
    }

    /// Maps a postable source document to a balanced entry.
    pub fn map(
        &self,
        txn: &SourceTransaction,
        posted_at: DateTime<Utc>,
    ) -> Result<JournalEntry, LedgerError> {
        if !txn.is_postable() {
            return Err(LedgerError::NotPostable {
                source_type: txn.source_type(),
                source_id: txn.source_id,
            });
        }

        let plan: Vec<(&str, Side, Decimal)> = match &txn.detail {
            SourceDetail::Invoice {
                subtotal, tax, total, ..
            } => vec![
                (codes::BANK, Side::Debit, *total),
                (codes::SALES_REVENUE, Side::Credit, *subtotal),
                (codes::TAX_PAYABLE, Side::Credit, *tax),
            ],
            SourceDetail::Expense {
                category, amount, ..
            } => vec![
                (expense_account_code(category), Side::Debit, *amount),
                (codes::BANK, Side::Credit, *amount),
            ],
            SourceDetail::PayrollRun {
                gross,
                net,
                deductions,
                ..
            } => vec![
                (codes::SALARIES, Side::Debit, *gross),
                (codes::BANK, Side::Credit, *net),
                (codes::PAYROLL_LIABILITIES, Side::Credit, *deductions),
            ],
            SourceDetail::PurchaseReceipt { amount, tax, .. } => {
                let payable = amount
                    .checked_add(*tax)
                    .ok_or(LedgerError::AmountOverflow("purchase receipt payable"))?;
                vec![
                    (codes::COST_OF_GOODS_SOLD, Side::Debit, *amount),
                    (codes::INPUT_TAX_CREDIT, Side::Debit, *tax),
                    (codes::ACCOUNTS_PAYABLE, Side::Credit, payable),
                ]
            }
            SourceDetail::SubscriptionCharge {
                amount, tax, total, ..
            } => vec![
                (codes::BANK, Side::Debit, *total),
                (codes::SUBSCRIPTION_REVENUE, Side::Credit, *amount),
                (codes::TAX_PAYABLE, Side::Credit, *tax),
            ],
        };

        let mut lines = Vec::with_capacity(plan.len());
        for (code, side, amount) in plan {
            if amount.is_zero() {
                continue;
            }
            let account = self.chart.require_active(code)?;
            lines.push(match side {
                Side::Debit => JournalLine::debit(account.id, amount),
                Side::Credit => JournalLine::credit(account.id, amount),
            });
        }

        let memo = if txn.reference.is_empty() {
            format!("{} {}", txn.source_type(), txn.source_id)
        } else {
            format!("{} {}", txn.source_type(), txn.reference)
        };

        JournalEntry::new(
            NewJournalEntry {
                tenant_id: txn.tenant_id,
                source_type: txn.source_type(),
                source_id: txn.source_id,
                entry_date: txn.occurred_at.with_timezone(&self.timezone).date_naive(),
                memo,
                lines,
            },
            posted_at,
        )
    }
}
