//! Poll cycle engine.
//!
//! Each cycle: fetch the lobby feed, filter to the allowed tables, run
//! every table's fresh numbers through its analyzer, and persist the
//! snapshots that changed. The classifier itself never does I/O — this
//! module owns all of it, and no failure here is fatal to the process:
//! a broken feed fails the cycle, a broken store costs one snapshot.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::source::NumberSource;
use crate::storage::Store;
use crate::strategy::TableRegistry;
use crate::types::RoundOutcome;

// ---------------------------------------------------------------------------
// Cycle report
// ---------------------------------------------------------------------------

/// Summary of a single poll cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_number: u64,
    /// Tables the feed showed this cycle (before the allow-list).
    pub tables_seen: usize,
    /// Tables that accepted at least one new number.
    pub tables_updated: usize,
    pub numbers_accepted: usize,
    pub rounds_won: usize,
    pub rounds_lost: usize,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cycle #{}: seen={} updated={} accepted={} won={} lost={}",
            self.cycle_number,
            self.tables_seen,
            self.tables_updated,
            self.numbers_accepted,
            self.rounds_won,
            self.rounds_lost,
        )
    }
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

/// Drives the per-cycle pipeline: source → registry → store.
pub struct Monitor {
    source: Box<dyn NumberSource>,
    registry: Arc<RwLock<TableRegistry>>,
    store: Option<Store>,
    config: MonitorConfig,
    cycle_count: u64,
}

impl Monitor {
    pub fn new(
        source: Box<dyn NumberSource>,
        registry: Arc<RwLock<TableRegistry>>,
        store: Option<Store>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            source,
            registry,
            store,
            config,
            cycle_count: 0,
        }
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    pub fn store(&self) -> Option<&Store> {
        self.store.as_ref()
    }

    /// Run one poll cycle.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        self.cycle_count += 1;
        info!(
            cycle = self.cycle_count,
            source = self.source.name(),
            "Starting poll cycle"
        );

        let readings = self
            .source
            .fetch_tables()
            .await
            .context("Number source fetch failed")?;
        let tables_seen = readings.len();

        let mut tables_updated = 0;
        let mut numbers_accepted = 0;
        let mut rounds_won = 0;
        let mut rounds_lost = 0;

        for reading in readings {
            if !self.config.is_table_allowed(&reading.id) {
                debug!(table = %reading.name, id = %reading.id, "Table not in allow-list, skipping");
                continue;
            }

            let (report, status) = {
                let mut registry = self.registry.write().await;
                let report = registry.ingest(&reading.id, &reading.name, &reading.draws);
                let status = report
                    .any_accepted()
                    .then(|| registry.status(&reading.id))
                    .flatten();
                (report, status)
            };

            numbers_accepted += report.accepted;
            for event in &report.events {
                match event.outcome() {
                    Some(RoundOutcome::Win) => rounds_won += 1,
                    Some(RoundOutcome::Loss) => rounds_lost += 1,
                    None => {}
                }
            }

            if let Some(status) = status {
                tables_updated += 1;
                info!(
                    table = %status.name,
                    latest = ?status.latest_number(),
                    state = %status.state,
                    wins = status.wins,
                    losses = status.losses,
                    "Table updated"
                );

                if let Some(store) = &self.store {
                    if let Err(e) = store.upsert_status(&status).await {
                        warn!(table = %status.name, error = %e, "Failed to persist table status");
                    }
                }
            }
        }

        let report = CycleReport {
            cycle_number: self.cycle_count,
            tables_seen,
            tables_updated,
            numbers_accepted,
            rounds_won,
            rounds_lost,
            timestamp: Utc::now(),
        };

        info!(
            cycle = report.cycle_number,
            seen = report.tables_seen,
            updated = report.tables_updated,
            accepted = report.numbers_accepted,
            won = report.rounds_won,
            lost = report.rounds_lost,
            "Poll cycle complete"
        );

        Ok(report)
    }

    /// Persist every table's current snapshot (used at shutdown).
    pub async fn persist_all(&self) -> Result<usize> {
        let Some(store) = &self.store else {
            return Ok(0);
        };

        let statuses = self.registry.read().await.statuses();
        let count = statuses.len();
        let results =
            futures::future::join_all(statuses.iter().map(|s| store.upsert_status(s))).await;

        for (status, result) in statuses.iter().zip(&results) {
            if let Err(e) = result {
                warn!(table = %status.name, error = %e, "Failed to persist table status");
            }
        }
        Ok(count)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
