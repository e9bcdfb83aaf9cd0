//! Alert evaluation and dispatch against a synced ledger.

mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use ledgerline_core::alerts::{AlertEvaluator, AlertRule, ConditionType, Operator};
use ledgerline_core::ledger::{LedgerSyncService, PeriodKey, SyncOptions};
use ledgerline_core::variance::{Dimension, VarianceDetector, VarianceSettings};
use ledgerline_db::{MemoryStore, OutboxDispatcher};
use ledgerline_shared::types::{AlertRuleId, TenantId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use common::{approved_expense, at, paid_invoice, seeded_store};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn group_rule(
    tenant_id: TenantId,
    name: &str,
    condition_type: ConditionType,
    operator: Operator,
    target_value: Decimal,
    group: &str,
) -> AlertRule {
    AlertRule {
        id: AlertRuleId::new(),
        tenant_id,
        name: name.into(),
        condition_type,
        operator,
        target_value,
        applies_to_account_id: None,
        applies_to_group: Some(group.into()),
        notify_channels: vec!["email".into()],
        is_active: true,
    }
}

fn low_cash(tenant_id: TenantId) -> AlertRule {
    group_rule(
        tenant_id,
        "Low cash",
        ConditionType::Threshold,
        Operator::Lt,
        dec!(500),
        "Cash & Bank",
    )
}

async fn sync(store: &Arc<MemoryStore>, tenant_id: TenantId, month: u32) {
    LedgerSyncService::new(Arc::clone(store))
        .sync_month(tenant_id, 2024, month, &SyncOptions::default())
        .await
        .unwrap();
}

/// Cash ends March at 100: 1000 in, 900 rent out.
async fn thin_march() -> (Arc<MemoryStore>, TenantId) {
    let (store, tenant, _) = seeded_store();
    store.add_source_transaction(paid_invoice(tenant.id, at(2024, 3, 2), dec!(1000)));
    store.add_source_transaction(approved_expense(tenant.id, at(2024, 3, 5), "rent", dec!(900)));
    sync(&store, tenant.id, 3).await;
    (store, tenant.id)
}

#[tokio::test]
async fn test_low_cash_fires_and_dispatches() {
    let (store, tenant_id) = thin_march().await;
    let rule = low_cash(tenant_id);
    store.add_alert_rule(rule.clone());
    let (outbox, mut rx) = OutboxDispatcher::channel(8);
    let alerts = AlertEvaluator::new(Arc::clone(&store), Arc::new(outbox), 3);

    let report = alerts
        .check_alerts_as_of(tenant_id, date(2024, 3, 31))
        .await
        .unwrap();

    assert_eq!(report.evaluated, 1);
    assert!(report.failures.is_empty());
    assert!(report.dispatch_failures.is_empty());
    assert_eq!(report.triggered.len(), 1);
    let event = &report.triggered[0];
    assert_eq!(event.rule_id, rule.id);
    assert_eq!(event.observed_value, dec!(100));
    assert!(event.dispatched);
    assert!(event.message.starts_with("Low cash"));

    let queued = rx.try_recv().unwrap();
    assert_eq!(queued.event_id, event.id);
    assert_eq!(queued.channels, vec!["email".to_string()]);

    let logged = store.alert_events(tenant_id);
    assert_eq!(logged.len(), 1);
    assert!(logged[0].dispatched);
}

#[tokio::test]
async fn test_threshold_not_met_is_quiet() {
    let (store, tenant_id) = thin_march().await;
    store.add_alert_rule(low_cash(tenant_id));
    let (outbox, _rx) = OutboxDispatcher::channel(8);
    let alerts = AlertEvaluator::new(Arc::clone(&store), Arc::new(outbox), 3);

    // Before the rent went out the bank held 1000.
    let report = alerts
        .check_alerts_as_of(tenant_id, date(2024, 3, 3))
        .await
        .unwrap();

    assert_eq!(report.evaluated, 1);
    assert!(report.triggered.is_empty());
    assert!(store.alert_events(tenant_id).is_empty());
}

#[tokio::test]
async fn test_month_over_month_change() {
    let (store, tenant, _) = seeded_store();
    store.add_source_transaction(paid_invoice(tenant.id, at(2024, 2, 10), dec!(1000)));
    store.add_source_transaction(paid_invoice(tenant.id, at(2024, 3, 10), dec!(1500)));
    sync(&store, tenant.id, 2).await;
    sync(&store, tenant.id, 3).await;
    store.add_alert_rule(group_rule(
        tenant.id,
        "Revenue swing",
        ConditionType::Threshold,
        Operator::PctChange,
        dec!(20),
        "Revenue",
    ));
    let (outbox, _rx) = OutboxDispatcher::channel(8);

    let report = AlertEvaluator::new(Arc::clone(&store), Arc::new(outbox), 3)
        .check_alerts_as_of(tenant.id, date(2024, 3, 31))
        .await
        .unwrap();

    assert_eq!(report.triggered.len(), 1);
    assert_eq!(report.triggered[0].observed_value, dec!(50));
}

#[tokio::test]
async fn test_unevaluable_rule_does_not_block_others() {
    let (store, tenant_id) = thin_march().await;
    // No January activity to compare March against.
    store.add_alert_rule(group_rule(
        tenant_id,
        "Revenue trend",
        ConditionType::Trend,
        Operator::Lt,
        dec!(-10),
        "Revenue",
    ));
    store.add_alert_rule(group_rule(
        tenant_id,
        "Royalty watch",
        ConditionType::Threshold,
        Operator::Gt,
        dec!(0),
        "Royalties",
    ));
    store.add_alert_rule(low_cash(tenant_id));
    let (outbox, _rx) = OutboxDispatcher::channel(8);

    let report = AlertEvaluator::new(Arc::clone(&store), Arc::new(outbox), 3)
        .check_alerts_as_of(tenant_id, date(2024, 3, 31))
        .await
        .unwrap();

    assert_eq!(report.evaluated, 3);
    assert_eq!(report.triggered.len(), 1);
    assert_eq!(report.failures.len(), 2);
    assert!(
        report
            .failures
            .iter()
            .all(|f| f.error_code == "ALERT_DATA_MISSING")
    );
}

#[tokio::test]
async fn test_anomaly_reads_stored_variance() {
    let (store, tenant, _) = seeded_store();
    let revenue = Dimension::Group("Revenue".into());
    store.set_variance_settings(
        tenant.id,
        VarianceSettings {
            dimensions: vec![revenue.clone()],
            ..VarianceSettings::default()
        },
    );
    store.set_budget(PeriodKey::new(tenant.id, 2024, 3).unwrap(), revenue, dec!(1000));
    store.add_source_transaction(paid_invoice(tenant.id, at(2024, 3, 10), dec!(1500)));
    sync(&store, tenant.id, 3).await;
    store.add_alert_rule(group_rule(
        tenant.id,
        "Revenue anomaly",
        ConditionType::Anomaly,
        Operator::Gt,
        dec!(30),
        "Revenue",
    ));
    let (outbox, _rx) = OutboxDispatcher::channel(8);
    let alerts = AlertEvaluator::new(Arc::clone(&store), Arc::new(outbox), 3);

    let before = alerts
        .check_alerts_as_of(tenant.id, date(2024, 3, 31))
        .await
        .unwrap();
    assert_eq!(before.failures.len(), 1);
    assert!(before.triggered.is_empty());

    VarianceDetector::new(Arc::clone(&store), VarianceSettings::default())
        .compute_period_variance(tenant.id, 2024, 3)
        .await
        .unwrap();

    let after = alerts
        .check_alerts_as_of(tenant.id, date(2024, 3, 31))
        .await
        .unwrap();
    assert!(after.failures.is_empty());
    assert_eq!(after.triggered.len(), 1);
    assert_eq!(after.triggered[0].observed_value, dec!(50));
}

#[tokio::test]
async fn test_rejected_channel_keeps_event_undispatched() {
    let (store, tenant_id) = thin_march().await;
    let mut rule = low_cash(tenant_id);
    rule.notify_channels = vec!["pager".into()];
    store.add_alert_rule(rule);
    let (outbox, mut rx) = OutboxDispatcher::channel(8);

    let report = AlertEvaluator::new(Arc::clone(&store), Arc::new(outbox), 3)
        .check_alerts_as_of(tenant_id, date(2024, 3, 31))
        .await
        .unwrap();

    assert_eq!(report.triggered.len(), 1);
    assert!(!report.triggered[0].dispatched);
    assert_eq!(report.dispatch_failures.len(), 1);
    assert_eq!(report.dispatch_failures[0].event_id, report.triggered[0].id);
    assert!(rx.try_recv().is_err());

    let logged = store.alert_events(tenant_id);
    assert_eq!(logged.len(), 1);
    assert!(!logged[0].dispatched);
}

#[tokio::test]
async fn test_rule_without_channels_is_only_logged() {
    let (store, tenant_id) = thin_march().await;
    let mut rule = low_cash(tenant_id);
    rule.notify_channels.clear();
    store.add_alert_rule(rule);
    let (outbox, mut rx) = OutboxDispatcher::channel(8);

    let report = AlertEvaluator::new(Arc::clone(&store), Arc::new(outbox), 3)
        .check_alerts_as_of(tenant_id, date(2024, 3, 31))
        .await
        .unwrap();

    assert_eq!(report.triggered.len(), 1);
    assert!(!report.triggered[0].dispatched);
    assert!(report.dispatch_failures.is_empty());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_inactive_rules_are_skipped() {
    let (store, tenant_id) = thin_march().await;
    let mut rule = low_cash(tenant_id);
    rule.is_active = false;
    store.add_alert_rule(rule);
    let (outbox, _rx) = OutboxDispatcher::channel(8);

    let report = AlertEvaluator::new(Arc::clone(&store), Arc::new(outbox), 3)
        .check_alerts_as_of(tenant_id, date(2024, 3, 31))
        .await
        .unwrap();

    assert_eq!(report.evaluated, 0);
    assert!(report.triggered.is_empty());
}
