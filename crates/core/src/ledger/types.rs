//! Chart-of-accounts domain types.

use ledgerline_shared::types::{AccountId, TenantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Top-level account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Asset account.
    Asset,
    /// Liability account.
    Liability,
    /// Equity account.
    Equity,
    /// Revenue account.
    Revenue,
    /// Expense account.
    Expense,
}

impl AccountType {
    /// Side on which the account's balance grows.
    ///
    /// Asset/Expense are debit-normal; Liability/Equity/Revenue are credit-normal.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }

    /// Revenue and expense accounts feed the P&L.
    #[must_use]
    pub const fn is_income_statement(self) -> bool {
        matches!(self, Self::Revenue | Self::Expense)
    }
}

/// Normal balance side of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalBalance {
    /// balance += debit - credit
    Debit,
    /// balance += credit - debit
    Credit,
}

impl NormalBalance {
    /// Balance change caused by a debit/credit pair.
    #[must_use]
    pub fn signed(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

/// Finer classification used by reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountSubtype {
    /// Bank and cash-on-hand.
    Cash,
    /// Receivables, input tax credit and other current assets.
    CurrentAsset,
    /// Long-lived assets.
    FixedAsset,
    /// Payables due within a year.
    CurrentLiability,
    /// Long-term debt.
    LongTermLiability,
    /// Direct cost of goods sold.
    CostOfGoodsSold,
    /// Operating expense.
    OperatingExpense,
    /// Non-operating expense.
    OtherExpense,
    /// Revenue from operations.
    OperatingRevenue,
    /// Non-operating income.
    OtherIncome,
}

/// A tenant-scoped chart-of-accounts node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAccount {
    /// Account ID.
    pub id: AccountId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Chart code, unique per tenant (e.g. "101").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Optional finer classification.
    #[serde(default)]
    pub subtype: Option<AccountSubtype>,
    /// Reporting group (e.g. "Operating Expenses").
    #[serde(default)]
    pub group: Option<String>,
    /// Parent node in the account tree.
    #[serde(default)]
    pub parent_account_id: Option<AccountId>,
    /// Balance carried in before the first journal entry, in normal-balance sign.
    #[serde(default)]
    pub opening_balance: Decimal,
    /// Inactive accounts cannot receive postings.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl LedgerAccount {
    /// Creates an active account with no subtype, group, parent or opening balance.
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
    ) -> Self {
        Self {
            id: AccountId::new(),
            tenant_id,
            code: code.into(),
            name: name.into(),
            account_type,
            subtype: None,
            group: None,
            parent_account_id: None,
            opening_balance: Decimal::ZERO,
            is_active: true,
        }
    }

    /// Sets the subtype.
    #[must_use]
    pub fn with_subtype(mut self, subtype: AccountSubtype) -> Self {
        self.subtype = Some(subtype);
        self
    }

    /// Sets the reporting group.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Sets the parent account.
    #[must_use]
    pub fn with_parent(mut self, parent: AccountId) -> Self {
        self.parent_account_id = Some(parent);
        self
    }

    /// Sets the opening balance.
    #[must_use]
    pub fn with_opening_balance(mut self, amount: Decimal) -> Self {
        self.opening_balance = amount;
        self
    }

    /// Normal balance side derived from the account type.
    #[must_use]
    pub const fn normal_balance(&self) -> NormalBalance {
        self.account_type.normal_balance()
    }

    /// Cash-type asset accounts drive cash position and cash flow.
    #[must_use]
    pub fn is_cash(&self) -> bool {
        self.account_type == AccountType::Asset && self.subtype == Some(AccountSubtype::Cash)
    }

    /// Cash plus other current assets.
    #[must_use]
    pub fn is_current_asset(&self) -> bool {
        self.account_type == AccountType::Asset
            && matches!(
                self.subtype,
                Some(AccountSubtype::Cash | AccountSubtype::CurrentAsset)
            )
    }

    /// Liabilities due within a year.
    #[must_use]
    pub fn is_current_liability(&self) -> bool {
        self.account_type == AccountType::Liability
            && self.subtype == Some(AccountSubtype::CurrentLiability)
    }

    /// Expense accounts reported under cost of goods sold.
    #[must_use]
    pub fn is_cost_of_goods_sold(&self) -> bool {
        self.account_type == AccountType::Expense
            && self.subtype == Some(AccountSubtype::CostOfGoodsSold)
    }

    /// Reporting group, falling back to a name derived from the classification.
    #[must_use]
    pub fn group_name(&self) -> &str {
        if let Some(group) = &self.group {
            return group;
        }
        match (self.account_type, self.subtype) {
            (AccountType::Expense, Some(AccountSubtype::CostOfGoodsSold)) => "Cost of Sales",
            (AccountType::Expense, _) => "Operating Expenses",
            (AccountType::Revenue, Some(AccountSubtype::OtherIncome)) => "Other Income",
            (AccountType::Revenue, _) => "Revenue",
            (AccountType::Asset, _) => "Assets",
            (AccountType::Liability, _) => "Liabilities",
            (AccountType::Equity, _) => "Equity",
        }
    }
}
