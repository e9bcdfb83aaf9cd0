//! The bundled demo snapshot, run through the full pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use ledgerline_core::store::TenantStore;
use ledgerline_core::variance::{Dimension, Severity, VarianceDirection};
use ledgerline_core::{PipelineSettings, TenantPipeline};
use ledgerline_db::{MemoryStore, OutboxDispatcher, Snapshot};
use ledgerline_shared::AppConfig;
use rust_decimal_macros::dec;

fn demo_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/demo-snapshot.json")
}

#[tokio::test]
async fn test_demo_snapshot_march_run() {
    let snapshot = Snapshot::load(demo_path()).unwrap();
    let store = Arc::new(MemoryStore::from_snapshot(snapshot));
    let (outbox, mut rx) = OutboxDispatcher::channel(16);
    let pipeline = TenantPipeline::new(
        Arc::clone(&store),
        Arc::new(outbox),
        PipelineSettings::from(&AppConfig::default()),
    );

    let tenants = store.active_tenants().await.unwrap();
    let names: Vec<&str> = tenants.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Acme Traders", "Lumen Labs"]);

    let acme = pipeline.run(tenants[0].id, 2024, 3, None).await.unwrap();
    assert_eq!(acme.sync.posted, 4);
    assert_eq!(acme.sync.ineligible, 1);
    assert!(acme.sync.failures.is_empty());

    let alerts = acme.alerts.unwrap();
    assert_eq!(alerts.evaluated, 2);
    assert_eq!(alerts.triggered.len(), 1);
    assert_eq!(alerts.triggered[0].observed_value, dec!(-40200));
    // No February activity to compare against.
    assert_eq!(alerts.failures.len(), 1);
    assert_eq!(alerts.failures[0].rule_name, "Revenue swing");

    let variance = acme.variance.unwrap();
    let record = |group: &str| {
        variance
            .records
            .iter()
            .find(|r| r.dimension == Dimension::Group(group.into()))
            .unwrap()
    };
    assert_eq!(record("Revenue").deviation_pct, Some(dec!(-71.43)));
    assert_eq!(record("Revenue").severity, Severity::Critical);
    assert_eq!(record("Revenue").direction, VarianceDirection::Unfavourable);
    assert_eq!(record("Payroll").severity, Severity::Normal);
    assert_eq!(record("Operating Expenses").severity, Severity::Undefined);

    let lumen = pipeline.run(tenants[1].id, 2024, 3, None).await.unwrap();
    assert_eq!(lumen.sync.posted, 2);
    let lumen_alerts = lumen.alerts.unwrap();
    assert_eq!(lumen_alerts.triggered.len(), 1);
    assert_eq!(lumen_alerts.triggered[0].observed_value, dec!(640));

    let mut delivered = 0;
    while rx.try_recv().is_ok() {
        delivered += 1;
    }
    assert_eq!(delivered, 2);
}
