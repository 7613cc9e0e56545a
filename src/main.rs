//! CROUPIER — Live Roulette Table Strategy Monitor
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores persisted table snapshots (or starts fresh), and runs the
//! fetch→analyze→persist poll loop with graceful shutdown.

use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use croupier::config::AppConfig;
use croupier::dashboard::{spawn_dashboard, AppState, MonitorState};
use croupier::monitor::{CycleReport, Monitor};
use croupier::source::live::LiveCasinoSource;
use croupier::storage::Store;
use croupier::strategy::TableRegistry;

const BANNER: &str = r#"
  ____ ____   ___  _   _ ____ ___ _____ ____
 / ___|  _ \ / _ \| | | |  _ \_ _| ____|  _ \
| |   | |_) | | | | | | | |_) | ||  _| | |_) |
| |___|  _ <| |_| | |_| |  __/| || |___|  _ <
 \____|_| \_\\___/ \___/|_|  |___|_____|_| \_\

  Live Roulette Table Strategy Monitor
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        monitor_name = %cfg.monitor.name,
        poll_interval_secs = cfg.monitor.poll_interval_secs,
        allowed_tables = cfg.monitor.allowed_tables.len(),
        lobby_url = %cfg.source.lobby_url,
        "CROUPIER starting up"
    );

    // -- Restore or create state -----------------------------------------

    let registry = Arc::new(RwLock::new(TableRegistry::new()));

    let store = if cfg.storage.enabled {
        let store = Store::open(&cfg.storage.db_path).await?;
        let snapshots = store.fetch_all().await?;
        if snapshots.is_empty() {
            info!("No saved snapshots found, starting fresh");
        } else {
            let restored = registry.write().await.hydrate(snapshots);
            info!(restored, "Resumed table tallies from storage");
        }
        Some(store)
    } else {
        info!("Storage disabled — snapshots are in-memory only");
        None
    };

    // -- Initialise components -------------------------------------------

    let api_key = cfg
        .source
        .api_key_env
        .as_deref()
        .and_then(|env| std::env::var(env).ok())
        .map(SecretString::new);
    if api_key.is_none() {
        warn!("No lobby API key configured — fetching the feed unauthenticated");
    }

    let source = LiveCasinoSource::new(
        &cfg.source.lobby_url,
        &cfg.monitor.allowed_tables,
        api_key,
        cfg.source.request_timeout_secs,
    )?;

    let dashboard_state: Option<AppState> = if cfg.dashboard.enabled {
        let state = Arc::new(MonitorState::new(&cfg.monitor.name, registry.clone()));
        spawn_dashboard(state.clone(), cfg.dashboard.port)?;
        Some(state)
    } else {
        None
    };

    let mut monitor = Monitor::new(
        Box::new(source),
        registry.clone(),
        store,
        cfg.monitor.clone(),
    );

    // -- Main loop -------------------------------------------------------

    let poll_interval = Duration::from_secs(cfg.monitor.poll_interval_secs);
    let mut interval = tokio::time::interval(poll_interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_secs = cfg.monitor.poll_interval_secs,
        "Entering main loop. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match monitor.run_cycle().await {
                    Ok(report) => {
                        log_cycle_report(&report);
                        if let Some(state) = &dashboard_state {
                            state.push_cycle(&report).await;
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "Cycle failed — continuing to next");
                    }
                }

                if let Some(max) = cfg.monitor.max_cycles {
                    if monitor.cycle_count() >= max {
                        info!(cycles = monitor.cycle_count(), "Cycle limit reached. Stopping.");
                        break;
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    // Persist final snapshots
    let persisted = monitor.persist_all().await?;
    info!(
        cycles = monitor.cycle_count(),
        tables = persisted,
        "CROUPIER shut down cleanly."
    );

    Ok(())
}

/// Log a human-readable cycle summary.
fn log_cycle_report(report: &CycleReport) {
    info!(
        cycle = report.cycle_number,
        seen = report.tables_seen,
        updated = report.tables_updated,
        accepted = report.numbers_accepted,
        won = report.rounds_won,
        lost = report.rounds_lost,
        "Cycle complete"
    );
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("croupier=info"));

    let json_logging = std::env::var("CROUPIER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
