//! JSON snapshots used to seed a [`MemoryStore`](crate::MemoryStore).

use std::collections::HashSet;
use std::path::Path;

use ledgerline_core::Tenant;
use ledgerline_core::alerts::AlertRule;
use ledgerline_core::ledger::{LedgerAccount, Period, PeriodKey, SourceTransaction};
use ledgerline_core::variance::{Dimension, VarianceSettings};
use ledgerline_shared::types::TenantId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The file could not be read.
    #[error("Failed to read snapshot {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not a valid snapshot document.
    #[error("Failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    /// A record refers to a tenant the snapshot does not define.
    #[error("Snapshot references unknown tenant {0}")]
    UnknownTenant(TenantId),

    /// A budget names an impossible month.
    #[error("Snapshot budget has invalid period {year}-{month:02}")]
    InvalidPeriod {
        /// Year.
        year: i32,
        /// Month.
        month: u32,
    },
}

/// Per-tenant variance configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarianceSettingsSeed {
    /// Tenant.
    pub tenant_id: TenantId,
    /// Settings.
    #[serde(flatten)]
    pub settings: VarianceSettings,
}

/// One budget figure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSeed {
    /// Tenant.
    pub tenant_id: TenantId,
    /// Year.
    pub year: i32,
    /// Month (1-12).
    pub month: u32,
    /// Budgeted dimension.
    pub dimension: Dimension,
    /// Amount.
    pub amount: Decimal,
}

/// Everything a store is seeded with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Tenants.
    #[serde(default)]
    pub tenants: Vec<Tenant>,
    /// Chart-of-accounts rows. Tenants without any get the standard chart.
    #[serde(default)]
    pub accounts: Vec<LedgerAccount>,
    /// Source documents.
    #[serde(default)]
    pub source_transactions: Vec<SourceTransaction>,
    /// Existing period records.
    #[serde(default)]
    pub periods: Vec<Period>,
    /// Variance configuration.
    #[serde(default)]
    pub variance_settings: Vec<VarianceSettingsSeed>,
    /// Budgets.
    #[serde(default)]
    pub budgets: Vec<BudgetSeed>,
    /// Alert rules.
    #[serde(default)]
    pub alert_rules: Vec<AlertRule>,
}

impl Snapshot {
    /// Reads and validates a snapshot file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parses and validates a snapshot document.
    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(raw)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Checks that every record belongs to a listed tenant and every budget
    /// names a real month.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let tenants: HashSet<TenantId> = self.tenants.iter().map(|t| t.id).collect();
        let known = |id: TenantId| {
            if tenants.contains(&id) {
                Ok(())
            } else {
                Err(SnapshotError::UnknownTenant(id))
            }
        };

        self.accounts.iter().try_for_each(|a| known(a.tenant_id))?;
        self.source_transactions
            .iter()
            .try_for_each(|t| known(t.tenant_id))?;
        self.periods.iter().try_for_each(|p| known(p.key.tenant_id()))?;
        self.variance_settings
            .iter()
            .try_for_each(|s| known(s.tenant_id))?;
        self.alert_rules.iter().try_for_each(|r| known(r.tenant_id))?;
        for budget in &self.budgets {
            known(budget.tenant_id)?;
            PeriodKey::new(budget.tenant_id, budget.year, budget.month).map_err(|_| {
                SnapshotError::InvalidPeriod {
                    year: budget.year,
                    month: budget.month,
                }
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use ledgerline_core::store::{LedgerStore, TenantStore, VarianceStore};
    use rust_decimal_macros::dec;

    const TENANT: &str = "0190b5a2-7c1e-7d3a-9f00-000000000001";

    fn document() -> serde_json::Value {
        serde_json::json!({
            "tenants": [{ "id": TENANT, "name": "Acme Traders" }],
            "source_transactions": [{
                "tenant_id": TENANT,
                "source_id": "0190b5a2-7c1e-7d3a-9f00-0000000000a1",
                "occurred_at": "2024-03-10T06:30:00Z",
                "reference": "INV-1001",
                "detail": {
                    "type": "invoice",
                    "status": "paid",
                    "subtotal": "10000.00",
                    "tax": "1800.00",
                    "total": "11800.00"
                }
            }],
            "budgets": [{
                "tenant_id": TENANT,
                "year": 2024,
                "month": 3,
                "dimension": { "kind": "group", "value": "Revenue" },
                "amount": "12000"
            }]
        })
    }

    #[tokio::test]
    async fn test_snapshot_seeds_store() {
        let snapshot = Snapshot::from_json(&document().to_string()).unwrap();
        let tenant_id = snapshot.tenants[0].id;
        let store = MemoryStore::from_snapshot(snapshot);

        let tenant = store.tenant(tenant_id).await.unwrap().unwrap();
        assert_eq!(tenant.timezone.to_string(), "Asia/Kolkata");
        assert_eq!(store.accounts(tenant_id).await.unwrap().len(), 17);

        let period = PeriodKey::new(tenant_id, 2024, 3).unwrap();
        let budget = store
            .budget_amount(period, &Dimension::Group("Revenue".into()))
            .await
            .unwrap();
        assert_eq!(budget, Some(dec!(12000)));
    }

    #[test]
    fn test_unknown_tenant_rejected() {
        let mut doc = document();
        doc["tenants"] = serde_json::json!([]);
        let err = Snapshot::from_json(&doc.to_string()).unwrap_err();
        assert!(matches!(err, SnapshotError::UnknownTenant(_)));
    }

    #[test]
    fn test_invalid_budget_month_rejected() {
        let mut doc = document();
        doc["budgets"][0]["month"] = serde_json::json!(13);
        let err = Snapshot::from_json(&doc.to_string()).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidPeriod { year: 2024, month: 13 }));
    }

    #[test]
    fn test_missing_file() {
        let err = Snapshot::load("/nonexistent/ledgerline.json").unwrap_err();
        assert!(matches!(err, SnapshotError::Io { .. }));
    }
}
