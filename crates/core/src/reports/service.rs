//! Report generation over posted journal entries.
//!
//! Everything here is a pure function of the chart and the entries passed
//! in, so identical inputs always produce identical reports.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use ledgerline_shared::types::{AccountId, TenantId, percent_of, round_money, round_to};
use rust_decimal::Decimal;

use super::error::ReportError;
use super::types::{
    CashAccountBalance, CashConversionCycle, CashCycleTerms, CashFlowDay, CashFlowReport,
    CashForecast, CashPosition, ForecastDay, LiquidityHealth, PlAccountLine, PlGroupTotal,
    PlSection, PlSummary, PlTrend, PlTrendPoint, WorkingCapital,
};
use crate::ledger::{
    AccountType, ChartOfAccounts, InvoiceStatus, JournalEntry, LedgerAccount, SourceDetail,
    SourceTransaction, accumulate,
};
use crate::tenant::Tenant;

const SECONDS_PER_DAY: Decimal = Decimal::from_parts(86_400, 0, 0, false, 0);

/// Current ratio above which positive working capital counts as healthy.
const HEALTHY_CURRENT_RATIO: Decimal = Decimal::from_parts(15, 0, 0, false, 1);

/// Longest accepted forecast horizon.
pub const MAX_FORECAST_DAYS: u32 = 366;

pub(crate) fn check_horizon(days_ahead: u32) -> Result<(), ReportError> {
    if days_ahead == 0 {
        return Err(ReportError::EmptyWindow("forecast horizon"));
    }
    if days_ahead > MAX_FORECAST_DAYS {
        return Err(ReportError::HorizonTooLong {
            requested: days_ahead,
            max: MAX_FORECAST_DAYS,
        });
    }
    Ok(())
}

/// Service for generating financial reports.
pub struct ReportService;

impl ReportService {
    /// P&L over `[start, end]` from entries dated in that range.
    pub fn pl_summary(
        tenant: &Tenant,
        chart: &ChartOfAccounts,
        entries: &[JournalEntry],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PlSummary, ReportError> {
        if start > end {
            return Err(ReportError::InvalidDateRange { start, end });
        }

        let balances = accumulate(
            chart,
            entries
                .iter()
                .filter(|e| e.entry_date() >= start && e.entry_date() <= end),
        );

        let mut revenue = PlSection::default();
        let mut cogs = PlSection::default();
        let mut opex = PlSection::default();
        let mut groups: BTreeMap<(AccountType, String), Decimal> = BTreeMap::new();

        for account in chart.accounts() {
            let Some(balance) = balances.get(&account.id) else {
                continue;
            };
            let section = match account.account_type {
                AccountType::Revenue => &mut revenue,
                AccountType::Expense if account.is_cost_of_goods_sold() => &mut cogs,
                AccountType::Expense => &mut opex,
                _ => continue,
            };
            let amount = balance.movement();
            section.total += amount;
            section.accounts.push(PlAccountLine {
                account_id: account.id,
                code: account.code.clone(),
                name: account.name.clone(),
                group: account.group_name().to_string(),
                amount,
                share_pct: Decimal::ZERO,
            });
            *groups
                .entry((account.account_type, account.group_name().to_string()))
                .or_insert(Decimal::ZERO) += amount;
        }

        for section in [&mut revenue, &mut cogs, &mut opex] {
            let total = section.total;
            for line in &mut section.accounts {
                line.share_pct = percent_of(line.amount, total);
            }
        }

        let gross_profit = revenue.total - cogs.total;
        let net_income = gross_profit - opex.total;
        let net_margin_pct = percent_of(net_income, revenue.total);
        let expense_ratio_pct = percent_of(cogs.total + opex.total, revenue.total);

        Ok(PlSummary {
            tenant_id: tenant.id,
            start,
            end,
            currency: tenant.base_currency,
            revenue,
            cost_of_goods_sold: cogs,
            operating_expenses: opex,
            gross_profit,
            net_income,
            net_margin_pct,
            expense_ratio_pct,
            groups: groups
                .into_iter()
                .map(|((account_type, group), amount)| PlGroupTotal {
                    group,
                    account_type,
                    amount,
                })
                .collect(),
        })
    }

    /// Revenue, expenses and net income for each month of `year`.
    #[must_use]
    pub fn pl_trend(
        tenant_id: TenantId,
        chart: &ChartOfAccounts,
        entries: &[JournalEntry],
        year: i32,
    ) -> PlTrend {
        let mut months: Vec<PlTrendPoint> = (1..=12)
            .map(|month| PlTrendPoint {
                month,
                label: format!("{year:04}-{month:02}"),
                revenue: Decimal::ZERO,
                expenses: Decimal::ZERO,
                net_income: Decimal::ZERO,
            })
            .collect();

        for entry in entries.iter().filter(|e| e.entry_date().year() == year) {
            let point = &mut months[entry.entry_date().month0() as usize];
            for line in entry.lines() {
                let Some(account) = chart.get(line.account_id) else {
                    continue;
                };
                let change = account.normal_balance().signed(line.debit, line.credit);
                match account.account_type {
                    AccountType::Revenue => point.revenue += change,
                    AccountType::Expense => point.expenses += change,
                    _ => {}
                }
            }
        }
        for point in &mut months {
            point.net_income = point.revenue - point.expenses;
        }

        PlTrend {
            tenant_id,
            year,
            months,
        }
    }

    /// Daily cash movement over `[start, end]`.
    ///
    /// `entries` must include everything dated up to `end`; earlier entries
    /// only feed the opening balance.
    pub fn cash_flow_daily(
        tenant_id: TenantId,
        chart: &ChartOfAccounts,
        entries: &[JournalEntry],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<CashFlowReport, ReportError> {
        if start > end {
            return Err(ReportError::InvalidDateRange { start, end });
        }

        let cash: HashSet<AccountId> = chart.cash_accounts().map(|a| a.id).collect();
        let mut opening_balance: Decimal = chart.cash_accounts().map(|a| a.opening_balance).sum();
        let mut per_day: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();

        for entry in entries.iter().filter(|e| e.entry_date() <= end) {
            for line in entry.lines().iter().filter(|l| cash.contains(&l.account_id)) {
                if entry.entry_date() < start {
                    opening_balance += line.debit - line.credit;
                } else {
                    let day = per_day
                        .entry(entry.entry_date())
                        .or_insert((Decimal::ZERO, Decimal::ZERO));
                    day.0 += line.debit;
                    day.1 += line.credit;
                }
            }
        }

        let mut balance = opening_balance;
        let mut total_inflow = Decimal::ZERO;
        let mut total_outflow = Decimal::ZERO;
        let days: Vec<CashFlowDay> = start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|date| {
                let (inflow, outflow) = per_day
                    .get(&date)
                    .copied()
                    .unwrap_or((Decimal::ZERO, Decimal::ZERO));
                let net = inflow - outflow;
                balance += net;
                total_inflow += inflow;
                total_outflow += outflow;
                CashFlowDay {
                    date,
                    inflow,
                    outflow,
                    net,
                    closing_balance: balance,
                }
            })
            .collect();

        Ok(CashFlowReport {
            tenant_id,
            start,
            end,
            opening_balance,
            days,
            total_inflow,
            total_outflow,
            closing_balance: balance,
        })
    }

    /// Balance of every active cash account at the end of `as_of`.
    #[must_use]
    pub fn cash_position(
        tenant_id: TenantId,
        chart: &ChartOfAccounts,
        entries: &[JournalEntry],
        as_of: NaiveDate,
    ) -> CashPosition {
        let balances = Self::balances_as_of(chart, entries, as_of);
        let accounts: Vec<CashAccountBalance> = chart
            .cash_accounts()
            .map(|account| CashAccountBalance {
                account_id: account.id,
                code: account.code.clone(),
                name: account.name.clone(),
                balance: balances.get(&account.id).copied().unwrap_or(account.opening_balance),
            })
            .collect();
        let total = accounts.iter().map(|a| a.balance).sum();

        CashPosition {
            tenant_id,
            as_of,
            accounts,
            total,
        }
    }

    /// Current assets against current liabilities at the end of `as_of`.
    #[must_use]
    pub fn working_capital(
        tenant_id: TenantId,
        chart: &ChartOfAccounts,
        entries: &[JournalEntry],
        as_of: NaiveDate,
    ) -> WorkingCapital {
        let balances = Self::balances_as_of(chart, entries, as_of);
        let sum = |pick: fn(&LedgerAccount) -> bool| -> Decimal {
            chart
                .accounts()
                .iter()
                .filter(|a| a.is_active && pick(a))
                .map(|a| balances.get(&a.id).copied().unwrap_or(a.opening_balance))
                .sum()
        };
        let current_assets = sum(LedgerAccount::is_current_asset);
        let current_liabilities = sum(LedgerAccount::is_current_liability);
        let working_capital = current_assets - current_liabilities;
        let current_ratio = (current_liabilities > Decimal::ZERO)
            .then(|| round_to(current_assets / current_liabilities, 2));

        let health = if working_capital <= Decimal::ZERO {
            LiquidityHealth::Critical
        } else if current_ratio.is_none_or(|ratio| ratio > HEALTHY_CURRENT_RATIO) {
            LiquidityHealth::Healthy
        } else {
            LiquidityHealth::Warning
        };

        WorkingCapital {
            tenant_id,
            as_of,
            current_assets,
            current_liabilities,
            working_capital,
            current_ratio,
            health,
        }
    }

    /// Projects the cash balance `days_ahead` days past `history.end` using the
    /// average daily net flow of `history`.
    pub fn forecast(history: &CashFlowReport, days_ahead: u32) -> Result<CashForecast, ReportError> {
        check_horizon(days_ahead)?;
        let lookback_days = u32::try_from(history.days.len()).unwrap_or(u32::MAX);
        if lookback_days == 0 {
            return Err(ReportError::EmptyWindow("forecast lookback"));
        }

        let net: Decimal = history.days.iter().map(|d| d.net).sum();
        let average = net / Decimal::from(lookback_days);

        let mut days = Vec::with_capacity(days_ahead as usize);
        for offset in 1..=days_ahead {
            let Some(date) = history.end.checked_add_days(Days::new(u64::from(offset))) else {
                break;
            };
            let projected_balance =
                round_money(history.closing_balance + average * Decimal::from(offset));
            days.push(ForecastDay {
                date,
                projected_balance,
                is_negative: projected_balance < Decimal::ZERO,
            });
        }
        let first_negative_date = days.iter().find(|d| d.is_negative).map(|d| d.date);

        Ok(CashForecast {
            tenant_id: history.tenant_id,
            as_of: history.end,
            starting_balance: history.closing_balance,
            average_daily_net: round_money(average),
            lookback_days,
            days,
            first_negative_date,
        })
    }

    /// Cash conversion cycle from paid invoices.
    ///
    /// Days sales outstanding averages issue-to-payment time over the most
    /// recent `terms.max_sample` paid invoices of `tenant_id` that carry an
    /// issue date, rounded to whole days. Payable and inventory days come
    /// from `terms`.
    #[must_use]
    pub fn cash_conversion_cycle(
        tenant_id: TenantId,
        invoices: &[SourceTransaction],
        as_of: NaiveDate,
        terms: &CashCycleTerms,
    ) -> CashConversionCycle {
        let mut collected: Vec<(DateTime<Utc>, i64)> = invoices
            .iter()
            .filter(|txn| txn.tenant_id == tenant_id)
            .filter_map(|txn| match &txn.detail {
                SourceDetail::Invoice {
                    status: InvoiceStatus::Paid,
                    issued_at: Some(issued_at),
                    ..
                } if *issued_at <= txn.occurred_at => {
                    Some((txn.occurred_at, (txn.occurred_at - *issued_at).num_seconds()))
                }
                _ => None,
            })
            .collect();
        collected.sort_by(|a, b| b.0.cmp(&a.0));
        collected.truncate(terms.max_sample);

        let sample_size = collected.len();
        let days_sales_outstanding = if sample_size == 0 {
            terms.default_sales_days
        } else {
            let total_days: Decimal = collected
                .iter()
                .map(|(_, secs)| Decimal::from(*secs) / SECONDS_PER_DAY)
                .sum();
            round_to(total_days / Decimal::from(sample_size), 0)
        };

        CashConversionCycle {
            tenant_id,
            as_of,
            days_sales_outstanding,
            days_payable_outstanding: terms.payable_days,
            days_inventory_outstanding: terms.inventory_days,
            cash_conversion_cycle: terms.inventory_days + days_sales_outstanding
                - terms.payable_days,
            sample_size,
            sales_days_estimated: sample_size == 0,
        }
    }

    /// Opening balance plus normal-signed movement through `as_of`, per account.
    #[must_use]
    pub fn balances_as_of(
        chart: &ChartOfAccounts,
        entries: &[JournalEntry],
        as_of: NaiveDate,
    ) -> BTreeMap<AccountId, Decimal> {
        let movements = accumulate(chart, entries.iter().filter(|e| e.entry_date() <= as_of));
        chart
            .accounts()
            .iter()
            .map(|account| {
                let movement = movements
                    .get(&account.id)
                    .map_or(Decimal::ZERO, crate::ledger::AccountBalance::movement);
                (account.id, account.opening_balance + movement)
            })
            .collect()
    }
}
