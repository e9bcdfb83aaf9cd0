//! Property tests for the mapping table and entry construction.

use chrono::{TimeZone, Utc};
use ledgerline_shared::types::{AccountId, SourceId, TenantId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::chart::ChartOfAccounts;
use super::entry::{JournalEntry, JournalLine, NewJournalEntry};
use super::error::LedgerError;
use super::mapping::EntryMapper;
use super::source::{
    ChargeStatus, DocumentStatus, ExpenseStatus, InvoiceStatus, SourceDetail, SourceTransaction,
    SourceType,
};

fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Internally consistent source documents of every kind.
fn consistent_detail() -> impl Strategy<Value = SourceDetail> {
    let category = prop::sample::select(vec!["Travel", "Office", "Marketing", "Utilities", "Rent", "Misc"]);
    prop_oneof![
        (amount(), amount()).prop_map(|(subtotal, tax)| SourceDetail::Invoice {
            status: InvoiceStatus::Paid,
            subtotal,
            tax,
            total: subtotal + tax,
            issued_at: None,
        }),
        (category, amount()).prop_map(|(category, amount)| SourceDetail::Expense {
            status: ExpenseStatus::Approved,
            category: category.to_string(),
            amount,
        }),
        (amount(), amount()).prop_map(|(net, deductions)| SourceDetail::PayrollRun {
            status: DocumentStatus::Posted,
            gross: net + deductions,
            net,
            deductions,
        }),
        (amount(), amount()).prop_map(|(amount, tax)| SourceDetail::PurchaseReceipt {
            status: DocumentStatus::Posted,
            amount,
            tax,
        }),
        (amount(), amount()).prop_map(|(amount, tax)| SourceDetail::SubscriptionCharge {
            status: ChargeStatus::Paid,
            amount,
            tax,
            total: amount + tax,
        }),
    ]
}

fn is_all_zero(detail: &SourceDetail) -> bool {
    match detail {
        SourceDetail::Invoice { total, .. } | SourceDetail::SubscriptionCharge { total, .. } => {
            total.is_zero()
        }
        SourceDetail::Expense { amount, .. } => amount.is_zero(),
        SourceDetail::PayrollRun { gross, .. } => gross.is_zero(),
        SourceDetail::PurchaseReceipt { amount, tax, .. } => (*amount + *tax).is_zero(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every entry the mapper produces balances.
    #[test]
    fn prop_mapped_entries_balance(detail in consistent_detail(), offset_secs in 0i64..2_592_000) {
        let tenant = TenantId::new();
        let chart = ChartOfAccounts::standard(tenant);
        let mapper = EntryMapper::new(&chart, chrono_tz::Asia::Kolkata);
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let zero = is_all_zero(&detail);
        let txn = SourceTransaction {
            tenant_id: tenant,
            source_id: SourceId::new(),
            occurred_at: start + chrono::Duration::seconds(offset_secs),
            reference: String::new(),
            detail,
        };

        match mapper.map(&txn, Utc::now()) {
            Ok(entry) => {
                let debit: Decimal = entry.lines().iter().map(|l| l.debit).sum();
                let credit: Decimal = entry.lines().iter().map(|l| l.credit).sum();
                prop_assert_eq!(debit, credit);
                prop_assert!(entry.lines().len() >= 2);
                prop_assert!(entry.lines().iter().all(|l| l.debit.is_zero() != l.credit.is_zero()));
            }
            // an all-zero document leaves fewer than two lines
            Err(LedgerError::InsufficientLines) => prop_assert!(zero),
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }

    /// Construction succeeds exactly when the lines balance.
    #[test]
    fn prop_entry_construction_requires_balance(
        debits in prop::collection::vec(1i64..1_000_000, 1..5),
        credits in prop::collection::vec(1i64..1_000_000, 1..5),
    ) {
        let account = AccountId::new();
        let mut lines: Vec<JournalLine> = debits
            .iter()
            .map(|d| JournalLine::debit(account, Decimal::new(*d, 2)))
            .collect();
        lines.extend(credits.iter().map(|c| JournalLine::credit(account, Decimal::new(*c, 2))));

        let result = JournalEntry::new(
            NewJournalEntry {
                tenant_id: TenantId::new(),
                source_type: SourceType::Expense,
                source_id: SourceId::new(),
                entry_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                memo: String::new(),
                lines,
            },
            Utc::now(),
        );

        let balanced = debits.iter().sum::<i64>() == credits.iter().sum::<i64>();
        prop_assert_eq!(result.is_ok(), balanced);
        if !balanced {
            let is_unbalanced = matches!(result, Err(LedgerError::UnbalancedEntry { .. }));
            prop_assert!(is_unbalanced);
        }
    }
}
