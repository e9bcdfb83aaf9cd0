//! Tenant chart of accounts with lookups by ID and code.

use std::collections::HashMap;

use ledgerline_shared::types::{AccountId, TenantId};

use super::error::LedgerError;
use super::mapping::codes;
use super::types::{AccountSubtype, AccountType, LedgerAccount};

/// Indexed view over a tenant's accounts.
#[derive(Debug, Clone, Default)]
pub struct ChartOfAccounts {
    accounts: Vec<LedgerAccount>,
    by_id: HashMap<AccountId, usize>,
    by_code: HashMap<String, usize>,
}

impl ChartOfAccounts {
    /// Indexes the given accounts. Accounts keep their order, sorted by code.
    #[must_use]
    pub fn new(mut accounts: Vec<LedgerAccount>) -> Self {
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        let by_id = accounts
            .iter()
            .enumerate()
            .map(|(idx, a)| (a.id, idx))
            .collect();
        let by_code = accounts
            .iter()
            .enumerate()
            .map(|(idx, a)| (a.code.clone(), idx))
            .collect();
        Self {
            accounts,
            by_id,
            by_code,
        }
    }

    /// Indexes the accounts owned by `tenant_id`, ignoring any others.
    #[must_use]
    pub fn for_tenant(tenant_id: TenantId, mut accounts: Vec<LedgerAccount>) -> Self {
        accounts.retain(|a| a.tenant_id == tenant_id);
        Self::new(accounts)
    }

    /// The standard chart provisioned for a new tenant.
    ///
    /// Setup helper only; syncing never creates accounts.
    #[must_use]
    pub fn standard(tenant_id: TenantId) -> Self {
        use AccountSubtype as S;
        use AccountType as T;

        let acct = |code: &str, name: &str, ty: T, subtype: S, group: &str| {
            LedgerAccount::new(tenant_id, code, name, ty)
                .with_subtype(subtype)
                .with_group(group)
        };

        Self::new(vec![
            acct(codes::BANK, "Bank", T::Asset, S::Cash, "Cash & Bank"),
            acct(codes::ACCOUNTS_RECEIVABLE, "Accounts Receivable", T::Asset, S::CurrentAsset, "Receivables"),
            acct(codes::INPUT_TAX_CREDIT, "Input Tax Credit", T::Asset, S::CurrentAsset, "Tax Assets"),
            acct(codes::ACCOUNTS_PAYABLE, "Accounts Payable", T::Liability, S::CurrentLiability, "Payables"),
            acct(codes::TAX_PAYABLE, "Tax Payable", T::Liability, S::CurrentLiability, "Tax Liabilities"),
            acct(codes::PAYROLL_LIABILITIES, "Payroll Liabilities", T::Liability, S::CurrentLiability, "Payables"),
            LedgerAccount::new(tenant_id, codes::OWNER_EQUITY, "Owner's Equity", T::Equity).with_group("Equity"),
            acct(codes::SALES_REVENUE, "Sales Revenue", T::Revenue, S::OperatingRevenue, "Revenue"),
            acct(codes::SUBSCRIPTION_REVENUE, "Subscription Revenue", T::Revenue, S::OperatingRevenue, "Revenue"),
            acct(codes::TRAVEL, "Travel Expense", T::Expense, S::OperatingExpense, "Operating Expenses"),
            acct(codes::OFFICE, "Office Expense", T::Expense, S::OperatingExpense, "Operating Expenses"),
            acct(codes::MARKETING, "Marketing Expense", T::Expense, S::OperatingExpense, "Operating Expenses"),
            acct(codes::UTILITIES, "Utilities Expense", T::Expense, S::OperatingExpense, "Operating Expenses"),
            acct(codes::RENT, "Rent Expense", T::Expense, S::OperatingExpense, "Operating Expenses"),
            acct(codes::COST_OF_GOODS_SOLD, "Cost of Goods Sold", T::Expense, S::CostOfGoodsSold, "Cost of Sales"),
            acct(codes::OTHER_EXPENSE, "Other Expense", T::Expense, S::OperatingExpense, "Operating Expenses"),
            acct(codes::SALARIES, "Salaries & Wages", T::Expense, S::OperatingExpense, "Payroll"),
        ])
    }

    /// All accounts, ordered by code.
    #[must_use]
    pub fn accounts(&self) -> &[LedgerAccount] {
        &self.accounts
    }

    /// Looks up an account by ID.
    #[must_use]
    pub fn get(&self, id: AccountId) -> Option<&LedgerAccount> {
        self.by_id.get(&id).map(|&idx| &self.accounts[idx])
    }

    /// Looks up an account by chart code.
    #[must_use]
    pub fn by_code(&self, code: &str) -> Option<&LedgerAccount> {
        self.by_code.get(code).map(|&idx| &self.accounts[idx])
    }

    /// Resolves a code to an active account.
    pub fn require_active(&self, code: &str) -> Result<&LedgerAccount, LedgerError> {
        let account = self
            .by_code(code)
            .ok_or_else(|| LedgerError::AccountNotFound(code.to_string()))?;
        if !account.is_active {
            return Err(LedgerError::AccountInactive(code.to_string()));
        }
        Ok(account)
    }

    /// Active cash-type accounts.
    pub fn cash_accounts(&self) -> impl Iterator<Item = &LedgerAccount> {
        self.accounts.iter().filter(|a| a.is_active && a.is_cash())
    }

    /// `root` and every account below it in the tree.
    #[must_use]
    pub fn subtree(&self, root: AccountId) -> Vec<AccountId> {
        let mut ids = vec![root];
        let mut cursor = 0;
        while cursor < ids.len() {
            let parent = ids[cursor];
            ids.extend(
                self.accounts
                    .iter()
                    .filter(|a| a.parent_account_id == Some(parent))
                    .map(|a| a.id),
            );
            cursor += 1;
        }
        ids
    }

    /// Accounts whose reporting group equals `group`.
    pub fn in_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a LedgerAccount> {
        self.accounts.iter().filter(move |a| a.group_name() == group)
    }
}
