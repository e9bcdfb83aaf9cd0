//! Source business transactions read from the operational modules.

use std::fmt;

use chrono::{DateTime, Utc};
use ledgerline_shared::types::{SourceId, TenantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of business document a journal entry is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Sales invoice.
    Invoice,
    /// Employee or vendor expense claim.
    Expense,
    /// Payroll run.
    PayrollRun,
    /// Goods receipt against a purchase order.
    PurchaseReceipt,
    /// Recurring subscription charge.
    SubscriptionCharge,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Invoice => "invoice",
            Self::Expense => "expense",
            Self::PayrollRun => "payroll_run",
            Self::PurchaseReceipt => "purchase_receipt",
            Self::SubscriptionCharge => "subscription_charge",
        };
        f.write_str(name)
    }
}

/// Idempotence key: at most one journal entry per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceKey {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Document kind.
    pub source_type: SourceType,
    /// Document ID.
    pub source_id: SourceId,
}

/// Invoice lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Not yet issued.
    Draft,
    /// Issued, awaiting payment.
    Sent,
    /// Paid in full.
    Paid,
    /// Cancelled.
    Void,
}

/// Expense claim lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    /// Awaiting approval.
    Pending,
    /// Approved for payment.
    Approved,
    /// Rejected.
    Rejected,
}

/// Lifecycle of payroll runs and purchase receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Still editable.
    Draft,
    /// Final.
    Posted,
}

/// Subscription charge lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeStatus {
    /// Not yet collected.
    Pending,
    /// Collected.
    Paid,
    /// Collection failed.
    Failed,
}

/// Per-kind amounts and status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceDetail {
    /// Sales invoice.
    Invoice {
        /// Status.
        status: InvoiceStatus,
        /// Amount before tax.
        subtotal: Decimal,
        /// Output tax.
        tax: Decimal,
        /// Amount collected.
        total: Decimal,
        /// When the invoice was raised; `occurred_at` is when it was paid.
        #[serde(default)]
        issued_at: Option<DateTime<Utc>>,
    },
    /// Expense claim.
    Expense {
        /// Status.
        status: ExpenseStatus,
        /// Free-text category (Travel, Office, ...).
        category: String,
        /// Amount paid.
        amount: Decimal,
    },
    /// Payroll run.
    PayrollRun {
        /// Status.
        status: DocumentStatus,
        /// Gross salaries.
        gross: Decimal,
        /// Paid out to employees.
        net: Decimal,
        /// Withheld for statutory remittance.
        deductions: Decimal,
    },
    /// Purchase receipt.
    PurchaseReceipt {
        /// Status.
        status: DocumentStatus,
        /// Goods value.
        amount: Decimal,
        /// Input tax.
        tax: Decimal,
    },
    /// Subscription charge.
    SubscriptionCharge {
        /// Status.
        status: ChargeStatus,
        /// Amount before tax.
        amount: Decimal,
        /// Output tax.
        tax: Decimal,
        /// Amount collected.
        total: Decimal,
    },
}

impl SourceDetail {
    /// Document kind.
    #[must_use]
    pub const fn source_type(&self) -> SourceType {
        match self {
            Self::Invoice { .. } => SourceType::Invoice,
            Self::Expense { .. } => SourceType::Expense,
            Self::PayrollRun { .. } => SourceType::PayrollRun,
            Self::PurchaseReceipt { .. } => SourceType::PurchaseReceipt,
            Self::SubscriptionCharge { .. } => SourceType::SubscriptionCharge,
        }
    }

    /// Only paid, approved or posted documents reach the ledger.
    #[must_use]
    pub const fn is_postable(&self) -> bool {
        match self {
            Self::Invoice { status, .. } => matches!(status, InvoiceStatus::Paid),
            Self::Expense { status, .. } => matches!(status, ExpenseStatus::Approved),
            Self::PayrollRun { status, .. } | Self::PurchaseReceipt { status, .. } => {
                matches!(status, DocumentStatus::Posted)
            }
            Self::SubscriptionCharge { status, .. } => matches!(status, ChargeStatus::Paid),
        }
    }
}

/// A business document that may become a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTransaction {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Document ID.
    pub source_id: SourceId,
    /// Effective instant (paid at, approved at, posted at).
    pub occurred_at: DateTime<Utc>,
    /// Human reference such as an invoice number.
    #[serde(default)]
    pub reference: String,
    /// Kind-specific data.
    pub detail: SourceDetail,
}

impl SourceTransaction {
    /// Idempotence key.
    #[must_use]
    pub const fn key(&self) -> SourceKey {
        SourceKey {
            tenant_id: self.tenant_id,
            source_type: self.detail.source_type(),
            source_id: self.source_id,
        }
    }

    /// Document kind.
    #[must_use]
    pub const fn source_type(&self) -> SourceType {
        self.detail.source_type()
    }

    /// Whether the document's status allows posting.
    #[must_use]
    pub const fn is_postable(&self) -> bool {
        self.detail.is_postable()
    }
}
