//! Account balance accumulation over journal lines.

use std::collections::BTreeMap;

use ledgerline_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::chart::ChartOfAccounts;
use super::entry::{JournalEntry, JournalLine};
use super::types::NormalBalance;

/// Debit/credit totals of one account over a set of entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account ID.
    pub account_id: AccountId,
    /// Side on which the balance grows.
    pub normal_balance: NormalBalance,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
}

impl AccountBalance {
    /// Creates an empty balance.
    #[must_use]
    pub const fn new(account_id: AccountId, normal_balance: NormalBalance) -> Self {
        Self {
            account_id,
            normal_balance,
            debit_total: Decimal::ZERO,
            credit_total: Decimal::ZERO,
        }
    }

    /// Adds a debit amount.
    pub fn add_debit(&mut self, amount: Decimal) {
        self.debit_total += amount;
    }

    /// Adds a credit amount.
    pub fn add_credit(&mut self, amount: Decimal) {
        self.credit_total += amount;
    }

    /// Adds both sides of a line.
    pub fn apply(&mut self, line: &JournalLine) {
        self.add_debit(line.debit);
        self.add_credit(line.credit);
    }

    /// Net movement in normal-balance sign.
    #[must_use]
    pub fn movement(&self) -> Decimal {
        self.normal_balance
            .signed(self.debit_total, self.credit_total)
    }
}

/// Per-account totals over `entries`, skipping lines whose account is not in `chart`.
#[must_use]
pub fn accumulate<'a>(
    chart: &ChartOfAccounts,
    entries: impl IntoIterator<Item = &'a JournalEntry>,
) -> BTreeMap<AccountId, AccountBalance> {
    let mut balances: BTreeMap<AccountId, AccountBalance> = BTreeMap::new();
    for entry in entries {
        for line in entry.lines() {
            let Some(account) = chart.get(line.account_id) else {
                continue;
            };
            balances
                .entry(line.account_id)
                .or_insert_with(|| AccountBalance::new(account.id, account.normal_balance()))
                .apply(line);
        }
    }
    balances
}
