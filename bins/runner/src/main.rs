//! Ledgerline runner
//!
//! Loads the configured snapshot and runs sync, alerts and variance for every
//! active tenant.
//!
//! `RUN_MODE=demo` pins the period to the month covered by the bundled
//! fixture snapshot.

use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::Datelike;
use ledgerline_core::store::TenantStore;
use ledgerline_core::{PipelineReport, PipelineSettings, Tenant, TenantPipeline};
use ledgerline_db::{MemoryStore, OutboxDispatcher, Snapshot};
use ledgerline_shared::AppConfig;
use ledgerline_shared::types::TenantId;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Notifications waiting for the drain task.
const OUTBOX_CAPACITY: usize = 1024;

/// Result of one tenant's run.
#[derive(Debug, Serialize)]
struct TenantOutcome {
    tenant_id: TenantId,
    tenant_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<PipelineReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<OutcomeError>,
}

#[derive(Debug, Serialize)]
struct OutcomeError {
    code: &'static str,
    message: String,
    retryable: bool,
}

/// Parses a `YYYY-MM` period.
fn parse_period(raw: &str) -> anyhow::Result<(i32, u32)> {
    let Some((year, month)) = raw.trim().split_once('-') else {
        bail!("period must look like YYYY-MM, got {raw:?}");
    };
    let year: i32 = year.parse().with_context(|| format!("invalid year in {raw:?}"))?;
    let month: u32 = month.parse().with_context(|| format!("invalid month in {raw:?}"))?;
    if !(1..=12).contains(&month) {
        bail!("month must be between 1 and 12, got {month}");
    }
    Ok((year, month))
}

/// The configured period, or the tenant's current month.
fn period_for(tenant: &Tenant, configured: Option<(i32, u32)>) -> (i32, u32) {
    configured.unwrap_or_else(|| {
        let today = tenant.today();
        (today.year(), today.month())
    })
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "ledgerline=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(config.logging.json);

    let configured_period = config
        .scheduler
        .period
        .as_deref()
        .map(parse_period)
        .transpose()?;

    let snapshot = Snapshot::load(&config.data.snapshot_path)?;
    let store = Arc::new(MemoryStore::from_snapshot(snapshot));
    info!(snapshot = %config.data.snapshot_path, "store loaded");

    let (outbox, mut notifications) = OutboxDispatcher::channel(OUTBOX_CAPACITY);
    let drain = tokio::spawn(async move {
        while let Some(request) = notifications.recv().await {
            info!(
                tenant_id = %request.tenant_id,
                event_id = %request.event_id,
                channels = ?request.channels,
                subject = %request.subject,
                "notification delivered"
            );
        }
    });

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling in-flight syncs");
            on_signal.cancel();
        }
    });

    let pipeline = TenantPipeline::new(
        Arc::clone(&store),
        Arc::new(outbox),
        PipelineSettings::from(&config),
    );
    let limit = Arc::new(Semaphore::new(config.scheduler.max_parallel_tenants.max(1)));
    let tenants = store.active_tenants().await?;
    info!(tenants = tenants.len(), "running tenant pipelines");

    let mut runs = JoinSet::new();
    for tenant in tenants {
        let permit = Arc::clone(&limit).acquire_owned().await?;
        let pipeline = pipeline.clone();
        let cancel = cancel.child_token();
        let (year, month) = period_for(&tenant, configured_period);
        runs.spawn(async move {
            let result = pipeline.run(tenant.id, year, month, Some(cancel)).await;
            drop(permit);
            (tenant, result)
        });
    }
    drop(pipeline);

    let mut outcomes = Vec::new();
    while let Some(joined) = runs.join_next().await {
        let (tenant, result) = joined.context("tenant pipeline task panicked")?;
        let outcome = match result {
            Ok(report) => {
                info!(tenant = %tenant.name, period = %report.period, "tenant done");
                TenantOutcome {
                    tenant_id: tenant.id,
                    tenant_name: tenant.name,
                    report: Some(report),
                    error: None,
                }
            }
            Err(err) => {
                error!(tenant = %tenant.name, error_code = err.error_code(), error = %err, "tenant failed");
                TenantOutcome {
                    tenant_id: tenant.id,
                    tenant_name: tenant.name,
                    report: None,
                    error: Some(OutcomeError {
                        code: err.error_code(),
                        message: err.to_string(),
                        retryable: err.is_retryable(),
                    }),
                }
            }
        };
        outcomes.push(outcome);
    }
    outcomes.sort_by(|a, b| a.tenant_name.cmp(&b.tenant_name));

    drain.await.context("notification drain task panicked")?;
    println!("{}", serde_json::to_string_pretty(&outcomes)?);

    Ok(())
}
