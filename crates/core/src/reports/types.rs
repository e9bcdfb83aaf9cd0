//! Report data types.

use chrono::NaiveDate;
use ledgerline_shared::types::{AccountId, Currency, TenantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::AccountType;

/// One account's contribution to a P&L bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlAccountLine {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Reporting group.
    pub group: String,
    /// Movement in normal-balance sign.
    pub amount: Decimal,
    /// Share of the bucket total, in percent.
    pub share_pct: Decimal,
}

/// A P&L bucket (revenue, cost of goods sold, operating expenses).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlSection {
    /// Bucket total.
    pub total: Decimal,
    /// Accounts with movement, ordered by code.
    pub accounts: Vec<PlAccountLine>,
}

/// Total per reporting group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlGroupTotal {
    /// Group name.
    pub group: String,
    /// Revenue or expense.
    pub account_type: AccountType,
    /// Group total.
    pub amount: Decimal,
}

/// Profit and loss over a date range, built only from posted entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlSummary {
    /// Tenant.
    pub tenant_id: TenantId,
    /// First day (inclusive).
    pub start: NaiveDate,
    /// Last day (inclusive).
    pub end: NaiveDate,
    /// Reporting currency.
    pub currency: Currency,
    /// Revenue bucket.
    pub revenue: PlSection,
    /// Cost of goods sold bucket.
    pub cost_of_goods_sold: PlSection,
    /// Operating expense bucket.
    pub operating_expenses: PlSection,
    /// Revenue minus cost of goods sold.
    pub gross_profit: Decimal,
    /// Gross profit minus operating expenses.
    pub net_income: Decimal,
    /// Net income as percent of revenue.
    pub net_margin_pct: Decimal,
    /// Total expenses as percent of revenue.
    pub expense_ratio_pct: Decimal,
    /// Totals per reporting group, ordered by type then name.
    pub groups: Vec<PlGroupTotal>,
}

impl PlSummary {
    /// Cost of goods sold plus operating expenses.
    #[must_use]
    pub fn total_expenses(&self) -> Decimal {
        self.cost_of_goods_sold.total + self.operating_expenses.total
    }
}

/// One month of a P&L trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlTrendPoint {
    /// Month (1-12).
    pub month: u32,
    /// `YYYY-MM`.
    pub label: String,
    /// Revenue.
    pub revenue: Decimal,
    /// Cost of goods sold plus operating expenses.
    pub expenses: Decimal,
    /// Revenue minus expenses.
    pub net_income: Decimal,
}

/// Monthly P&L for a calendar year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlTrend {
    /// Tenant.
    pub tenant_id: TenantId,
    /// Year.
    pub year: i32,
    /// Twelve points, January first.
    pub months: Vec<PlTrendPoint>,
}

/// Cash movement of one tenant-local day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowDay {
    /// Day.
    pub date: NaiveDate,
    /// Debits to cash accounts.
    pub inflow: Decimal,
    /// Credits to cash accounts.
    pub outflow: Decimal,
    /// Inflow minus outflow.
    pub net: Decimal,
    /// Cash balance at the end of the day.
    pub closing_balance: Decimal,
}

/// Daily cash flow over a trailing window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowReport {
    /// Tenant.
    pub tenant_id: TenantId,
    /// First day of the window.
    pub start: NaiveDate,
    /// Last day of the window.
    pub end: NaiveDate,
    /// Cash balance before the window.
    pub opening_balance: Decimal,
    /// One row per day, oldest first, including days without movement.
    pub days: Vec<CashFlowDay>,
    /// Sum of inflows.
    pub total_inflow: Decimal,
    /// Sum of outflows.
    pub total_outflow: Decimal,
    /// Cash balance after the window.
    pub closing_balance: Decimal,
}

/// Balance of one cash account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashAccountBalance {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Opening balance plus debits minus credits.
    pub balance: Decimal,
}

/// Running balance of all cash accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashPosition {
    /// Tenant.
    pub tenant_id: TenantId,
    /// Balance date (inclusive).
    pub as_of: NaiveDate,
    /// Per-account balances.
    pub accounts: Vec<CashAccountBalance>,
    /// Sum over cash accounts.
    pub total: Decimal,
}

/// Working-capital health band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiquidityHealth {
    /// Positive working capital and current ratio above 1.5.
    Healthy,
    /// Positive working capital, thin ratio.
    Warning,
    /// Zero or negative working capital.
    Critical,
}

/// Current assets against current liabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingCapital {
    /// Tenant.
    pub tenant_id: TenantId,
    /// Balance date (inclusive).
    pub as_of: NaiveDate,
    /// Cash plus other current assets.
    pub current_assets: Decimal,
    /// Current liabilities.
    pub current_liabilities: Decimal,
    /// Assets minus liabilities.
    pub working_capital: Decimal,
    /// Assets divided by liabilities (2 places); absent with no liabilities.
    pub current_ratio: Option<Decimal>,
    /// Health band.
    pub health: LiquidityHealth,
}

/// One projected day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// Day.
    pub date: NaiveDate,
    /// Projected end-of-day cash balance.
    pub projected_balance: Decimal,
    /// Whether the projection is below zero.
    pub is_negative: bool,
}

/// Straight-line cash projection from the trailing average daily net flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashForecast {
    /// Tenant.
    pub tenant_id: TenantId,
    /// Last actual day.
    pub as_of: NaiveDate,
    /// Cash balance at `as_of`.
    pub starting_balance: Decimal,
    /// Average daily net flow over the lookback window, rounded.
    pub average_daily_net: Decimal,
    /// Lookback window length in days.
    pub lookback_days: u32,
    /// Projected days, nearest first.
    pub days: Vec<ForecastDay>,
    /// First projected day with a negative balance.
    pub first_negative_date: Option<NaiveDate>,
}

/// Day counts behind a cash conversion cycle that the ledger cannot observe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashCycleTerms {
    /// Days sales outstanding used when no paid invoice carries an issue date.
    pub default_sales_days: Decimal,
    /// Days payable outstanding.
    pub payable_days: Decimal,
    /// Days inventory outstanding; zero for service businesses.
    pub inventory_days: Decimal,
    /// Most recent paid invoices averaged into days sales outstanding.
    pub max_sample: usize,
}

impl Default for CashCycleTerms {
    fn default() -> Self {
        Self {
            default_sales_days: Decimal::from(25),
            payable_days: Decimal::from(30),
            inventory_days: Decimal::ZERO,
            max_sample: 100,
        }
    }
}

/// Days between paying suppliers and collecting from customers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashConversionCycle {
    /// Tenant.
    pub tenant_id: TenantId,
    /// Last day considered (inclusive).
    pub as_of: NaiveDate,
    /// Average issue-to-payment days of recent paid invoices, whole days.
    pub days_sales_outstanding: Decimal,
    /// Days payable outstanding.
    pub days_payable_outstanding: Decimal,
    /// Days inventory outstanding.
    pub days_inventory_outstanding: Decimal,
    /// Inventory days plus sales days minus payable days.
    pub cash_conversion_cycle: Decimal,
    /// Paid invoices averaged.
    pub sample_size: usize,
    /// True when no invoice qualified and the default sales days were used.
    pub sales_days_estimated: bool,
}
