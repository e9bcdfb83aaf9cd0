//! Shared fixtures for store-backed integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use ledgerline_core::Tenant;
use ledgerline_core::ledger::{
    ChargeStatus, ChartOfAccounts, DocumentStatus, ExpenseStatus, InvoiceStatus, SourceDetail,
    SourceTransaction,
};
use ledgerline_db::MemoryStore;
use ledgerline_shared::types::{SourceId, TenantId};
use rust_decimal::Decimal;

/// A store with one tenant on the standard chart.
pub fn seeded_store() -> (Arc<MemoryStore>, Tenant, ChartOfAccounts) {
    let store = MemoryStore::new();
    let tenant = Tenant::new(TenantId::new(), "Acme Traders");
    store.insert_tenant(tenant.clone());
    let chart = store.provision_standard_chart(tenant.id);
    (Arc::new(store), tenant, chart)
}

/// 11:30 in Kolkata on the given day.
pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 6, 0, 0).unwrap()
}

pub fn invoice(
    tenant_id: TenantId,
    occurred_at: DateTime<Utc>,
    subtotal: Decimal,
    tax: Decimal,
    status: InvoiceStatus,
) -> SourceTransaction {
    SourceTransaction {
        tenant_id,
        source_id: SourceId::new(),
        occurred_at,
        reference: format!("INV-{}", occurred_at.format("%m%d")),
        detail: SourceDetail::Invoice {
            status,
            subtotal,
            tax,
            total: subtotal + tax,
            issued_at: None,
        },
    }
}

pub fn paid_invoice(tenant_id: TenantId, occurred_at: DateTime<Utc>, subtotal: Decimal) -> SourceTransaction {
    invoice(tenant_id, occurred_at, subtotal, Decimal::ZERO, InvoiceStatus::Paid)
}

/// Paid invoice raised at `issued_at` and settled at `paid_at`.
pub fn settled_invoice(
    tenant_id: TenantId,
    issued_at: DateTime<Utc>,
    paid_at: DateTime<Utc>,
    subtotal: Decimal,
) -> SourceTransaction {
    let mut txn = paid_invoice(tenant_id, paid_at, subtotal);
    if let SourceDetail::Invoice { issued_at: slot, .. } = &mut txn.detail {
        *slot = Some(issued_at);
    }
    txn
}

pub fn expense(
    tenant_id: TenantId,
    occurred_at: DateTime<Utc>,
    category: &str,
    amount: Decimal,
    status: ExpenseStatus,
) -> SourceTransaction {
    SourceTransaction {
        tenant_id,
        source_id: SourceId::new(),
        occurred_at,
        reference: format!("EXP-{category}"),
        detail: SourceDetail::Expense {
            status,
            category: category.to_string(),
            amount,
        },
    }
}

pub fn approved_expense(
    tenant_id: TenantId,
    occurred_at: DateTime<Utc>,
    category: &str,
    amount: Decimal,
) -> SourceTransaction {
    expense(tenant_id, occurred_at, category, amount, ExpenseStatus::Approved)
}

pub fn payroll(
    tenant_id: TenantId,
    occurred_at: DateTime<Utc>,
    gross: Decimal,
    deductions: Decimal,
) -> SourceTransaction {
    SourceTransaction {
        tenant_id,
        source_id: SourceId::new(),
        occurred_at,
        reference: "PAYRUN".into(),
        detail: SourceDetail::PayrollRun {
            status: DocumentStatus::Posted,
            gross,
            net: gross - deductions,
            deductions,
        },
    }
}

pub fn subscription_charge(
    tenant_id: TenantId,
    occurred_at: DateTime<Utc>,
    amount: Decimal,
    tax: Decimal,
) -> SourceTransaction {
    SourceTransaction {
        tenant_id,
        source_id: SourceId::new(),
        occurred_at,
        reference: "SUB".into(),
        detail: SourceDetail::SubscriptionCharge {
            status: ChargeStatus::Paid,
            amount,
            tax,
            total: amount + tax,
        },
    }
}
