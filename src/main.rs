use std::sync::Arc;

use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edflow_core::alerts::standard_rules;
use edflow_core::config::{
    event_lease_from_env_value, page_size_from_env_value, scan_interval_from_env_value,
    triage_threshold_from_env_value, waiting_threshold_from_env_value,
};
use edflow_core::{AlertEngine, CoreConfig, MemoryStore};

/// Main entry point for the EDFLOW alert scheduler
///
/// Runs the periodic alert scan against the configured store on a fixed
/// interval, independent of command traffic. A deployment runs exactly one
/// scheduler instance; overlapping scans are safe but wasted work.
///
/// This binary wires the in-memory reference store. A production deployment
/// swaps in a database-backed implementation of the same repository traits
/// and hosts the command surface in its API adapter.
///
/// # Environment Variables
/// - `EDFLOW_SCAN_INTERVAL_SECS`: seconds between scan cycles (default: 60)
/// - `EDFLOW_TRIAGE_THRESHOLD_MINUTES`: triage reassessment window (default: 30)
/// - `EDFLOW_WAITING_THRESHOLD_MINUTES`: disposition decision window (default: 120)
/// - `EDFLOW_SCAN_PAGE_SIZE`: encounters loaded per page (default: 100)
/// - `EDFLOW_EVENT_LEASE_SECS`: claim lease on unprocessed events (default: 300)
///
/// # Returns
/// * `Ok(())` - On clean shutdown (ctrl-c)
/// * `Err(anyhow::Error)` - If configuration is invalid
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("edflow=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = CoreConfig::new(
        scan_interval_from_env_value(std::env::var("EDFLOW_SCAN_INTERVAL_SECS").ok())?,
        triage_threshold_from_env_value(std::env::var("EDFLOW_TRIAGE_THRESHOLD_MINUTES").ok())?,
        waiting_threshold_from_env_value(std::env::var("EDFLOW_WAITING_THRESHOLD_MINUTES").ok())?,
        page_size_from_env_value(std::env::var("EDFLOW_SCAN_PAGE_SIZE").ok())?,
        event_lease_from_env_value(std::env::var("EDFLOW_EVENT_LEASE_SECS").ok())?,
        edflow_core::constants::DEFAULT_EVENT_CLAIM_BATCH,
    )?;

    tracing::info!(
        "++ Starting EDFLOW alert scheduler (interval {:?})",
        cfg.scan_interval()
    );

    let store = Arc::new(MemoryStore::new());
    let engine = AlertEngine::new(store.clone(), store, standard_rules(&cfg), &cfg);

    let mut ticker = tokio::time::interval(cfg.scan_interval());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // scan() logs its own cycle summary and isolates per-encounter failures.
                engine.scan(Utc::now());
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("++ Shutting down EDFLOW alert scheduler");
                break;
            }
        }
    }

    Ok(())
}
