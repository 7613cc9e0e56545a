//! Dashboard API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<MonitorState>`;
//! handlers only ever take read locks — the poll loop is the sole writer.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::monitor::CycleReport;
use crate::strategy::TableRegistry;
use crate::types::{TableState, TableStatus};

/// How many cycle log entries are retained in memory.
const MAX_CYCLE_LOG: usize = 500;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct MonitorState {
    pub monitor_name: String,
    pub registry: Arc<RwLock<TableRegistry>>,
    pub cycle_log: RwLock<Vec<CycleLogEntry>>,
    pub started_at: DateTime<Utc>,
}

impl MonitorState {
    pub fn new(monitor_name: &str, registry: Arc<RwLock<TableRegistry>>) -> Self {
        Self {
            monitor_name: monitor_name.to_string(),
            registry,
            cycle_log: RwLock::new(Vec::new()),
            started_at: Utc::now(),
        }
    }

    /// Record a completed poll cycle for the `/api/cycles` endpoint.
    pub async fn push_cycle(&self, report: &CycleReport) {
        let mut log = self.cycle_log.write().await;
        log.push(CycleLogEntry::from(report));
        if log.len() > MAX_CYCLE_LOG {
            let excess = log.len() - MAX_CYCLE_LOG;
            log.drain(..excess);
        }
    }
}

pub type AppState = Arc<MonitorState>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Full snapshot plus the derived win rate, as the storage/API contract.
#[derive(Debug, Clone, Serialize)]
pub struct TableResponse {
    #[serde(flatten)]
    pub status: TableStatus,
    pub win_rate: f64,
}

impl From<TableStatus> for TableResponse {
    fn from(status: TableStatus) -> Self {
        let win_rate = status.win_rate();
        Self { status, win_rate }
    }
}

/// Compact per-table summary for the lobby view.
#[derive(Debug, Clone, Serialize)]
pub struct LatestEntry {
    pub id: String,
    pub name: String,
    pub latest_number: Option<u8>,
    pub state: TableState,
    pub trigger_number: i8,
    pub suggestion: String,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<TableStatus> for LatestEntry {
    fn from(status: TableStatus) -> Self {
        Self {
            latest_number: status.latest_number(),
            win_rate: status.win_rate(),
            id: status.id,
            name: status.name,
            state: status.state,
            trigger_number: status.trigger_number,
            suggestion: status.suggestion,
            wins: status.wins,
            losses: status.losses,
            updated_at: status.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleLogEntry {
    pub cycle_number: u64,
    pub timestamp: String,
    pub tables_seen: usize,
    pub tables_updated: usize,
    pub numbers_accepted: usize,
    pub rounds_won: usize,
    pub rounds_lost: usize,
}

impl From<&CycleReport> for CycleLogEntry {
    fn from(report: &CycleReport) -> Self {
        Self {
            cycle_number: report.cycle_number,
            timestamp: report.timestamp.to_rfc3339(),
            tables_seen: report.tables_seen,
            tables_updated: report.tables_updated,
            numbers_accepted: report.numbers_accepted,
            rounds_won: report.rounds_won,
            rounds_lost: report.rounds_lost,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub service: String,
    pub uptime_secs: i64,
    pub cycles_run: u64,
    pub tables_monitored: usize,
    pub total_wins: u32,
    pub total_losses: u32,
    pub overall_win_rate: f64,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/tables
pub async fn get_tables(State(state): State<AppState>) -> Json<Vec<TableResponse>> {
    Json(
        sorted_statuses(&state)
            .await
            .into_iter()
            .map(TableResponse::from)
            .collect(),
    )
}

/// GET /api/tables/latest
pub async fn get_latest(State(state): State<AppState>) -> Json<Vec<LatestEntry>> {
    Json(
        sorted_statuses(&state)
            .await
            .into_iter()
            .map(LatestEntry::from)
            .collect(),
    )
}

/// GET /api/tables/:id
pub async fn get_table(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TableResponse>, StatusCode> {
    state
        .registry
        .read()
        .await
        .status(&id)
        .map(|status| Json(TableResponse::from(status)))
        .ok_or(StatusCode::NOT_FOUND)
}

/// GET /api/cycles
pub async fn get_cycles(State(state): State<AppState>) -> Json<Vec<CycleLogEntry>> {
    let log = state.cycle_log.read().await;
    // Return last 100 cycles
    let start = log.len().saturating_sub(100);
    Json(log[start..].to_vec())
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let statuses = state.registry.read().await.statuses();
    let total_wins: u32 = statuses.iter().map(|s| s.wins).sum();
    let total_losses: u32 = statuses.iter().map(|s| s.losses).sum();
    let rounds = total_wins + total_losses;
    let cycles_run = state
        .cycle_log
        .read()
        .await
        .last()
        .map(|e| e.cycle_number)
        .unwrap_or(0);

    Json(StatusResponse {
        service: state.monitor_name.clone(),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
        cycles_run,
        tables_monitored: statuses.len(),
        total_wins,
        total_losses,
        overall_win_rate: if rounds == 0 {
            0.0
        } else {
            (f64::from(total_wins) / f64::from(rounds)) * 100.0
        },
    })
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Snapshots ordered most recently updated first (never-updated last).
async fn sorted_statuses(state: &AppState) -> Vec<TableStatus> {
    let mut statuses = state.registry.read().await.statuses();
    statuses.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    statuses
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
