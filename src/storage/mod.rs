//! Persistence layer.
//!
//! Saves table status snapshots to SQLite, one row per table, upserted
//! whenever a table accepts a new number. On startup the registry is
//! hydrated from here so win/loss tallies survive restarts. Array fields
//! are stored as JSON text — the snapshot shape, not the database, is the
//! contract.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

use crate::types::{CroupierError, TableState, TableStatus};

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS tables (
    id                       TEXT PRIMARY KEY,
    name                     TEXT NOT NULL,
    state                    TEXT NOT NULL,
    trigger_number           INTEGER NOT NULL,
    previous_trigger_number  INTEGER NOT NULL,
    terminals_current        TEXT NOT NULL,
    terminals_previous       TEXT NOT NULL,
    terminals_sum_current    INTEGER NOT NULL,
    terminals_sum_previous   INTEGER NOT NULL,
    suggestion               TEXT NOT NULL,
    wins                     INTEGER NOT NULL,
    losses                   INTEGER NOT NULL,
    total_observed           INTEGER NOT NULL,
    recent_numbers           TEXT NOT NULL,
    updated_at               TEXT
)";

/// SQLite-backed snapshot store.
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the store at the given path.
    pub async fn open(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let store = Self::connect(options)
            .await
            .with_context(|| format!("Failed to open snapshot store at {path}"))?;
        info!(path, "Snapshot store opened");
        Ok(store)
    }

    /// In-memory store for tests.
    pub async fn in_memory() -> Result<Self> {
        Self::connect(SqliteConnectOptions::new().filename(":memory:"))
            .await
            .context("Failed to open in-memory snapshot store")
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self> {
        // One connection: the poll loop is the only writer, and an
        // in-memory database exists per connection — it must not be reaped.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .context("Failed to initialise snapshot schema")?;

        Ok(Self { pool })
    }

    /// Insert or update one table's snapshot.
    pub async fn upsert_status(&self, status: &TableStatus) -> Result<()> {
        sqlx::query(
            "INSERT INTO tables (
                id, name, state, trigger_number, previous_trigger_number,
                terminals_current, terminals_previous,
                terminals_sum_current, terminals_sum_previous,
                suggestion, wins, losses, total_observed, recent_numbers, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                state = excluded.state,
                trigger_number = excluded.trigger_number,
                previous_trigger_number = excluded.previous_trigger_number,
                terminals_current = excluded.terminals_current,
                terminals_previous = excluded.terminals_previous,
                terminals_sum_current = excluded.terminals_sum_current,
                terminals_sum_previous = excluded.terminals_sum_previous,
                suggestion = excluded.suggestion,
                wins = excluded.wins,
                losses = excluded.losses,
                total_observed = excluded.total_observed,
                recent_numbers = excluded.recent_numbers,
                updated_at = excluded.updated_at",
        )
        .bind(&status.id)
        .bind(&status.name)
        .bind(status.state.to_string())
        .bind(i64::from(status.trigger_number))
        .bind(i64::from(status.previous_trigger_number))
        .bind(serde_json::to_string(&status.terminals_current)?)
        .bind(serde_json::to_string(&status.terminals_previous)?)
        .bind(i64::from(status.terminals_sum_current))
        .bind(i64::from(status.terminals_sum_previous))
        .bind(&status.suggestion)
        .bind(i64::from(status.wins))
        .bind(i64::from(status.losses))
        .bind(status.total_observed as i64)
        .bind(serde_json::to_string(&status.recent_numbers)?)
        .bind(status.updated_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to upsert snapshot for table {}", status.id))?;

        debug!(table = %status.name, "Snapshot persisted");
        Ok(())
    }

    /// All snapshots, most recently updated first.
    pub async fn fetch_all(&self) -> Result<Vec<TableStatus>> {
        let rows = sqlx::query("SELECT * FROM tables ORDER BY updated_at DESC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch snapshots")?;

        rows.iter().map(Self::row_to_status).collect()
    }

    /// One table's snapshot, if persisted.
    pub async fn fetch(&self, id: &str) -> Result<Option<TableStatus>> {
        let row = sqlx::query("SELECT * FROM tables WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to fetch snapshot for table {id}"))?;

        row.as_ref().map(Self::row_to_status).transpose()
    }

    /// Delete a table's snapshot. Returns false if the id was unknown.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tables WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete snapshot for table {id}"))?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_status(row: &SqliteRow) -> Result<TableStatus> {
        let state: String = row.try_get("state")?;
        let state: TableState = state
            .parse()
            .map_err(|e| CroupierError::Storage(format!("bad state column: {e}")))?;

        let updated_at: Option<String> = row.try_get("updated_at")?;
        let updated_at = updated_at
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| CroupierError::Storage(format!("bad updated_at column: {e}")))
            })
            .transpose()?;

        let terminals_current: Vec<u8> =
            serde_json::from_str(row.try_get::<String, _>("terminals_current")?.as_str())
                .context("bad terminals_current column")?;
        let terminals_previous: Vec<u8> =
            serde_json::from_str(row.try_get::<String, _>("terminals_previous")?.as_str())
                .context("bad terminals_previous column")?;
        let recent_numbers: Vec<u8> =
            serde_json::from_str(row.try_get::<String, _>("recent_numbers")?.as_str())
                .context("bad recent_numbers column")?;

        Ok(TableStatus {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            state,
            trigger_number: row.try_get::<i64, _>("trigger_number")? as i8,
            previous_trigger_number: row.try_get::<i64, _>("previous_trigger_number")? as i8,
            terminals_current,
            terminals_previous,
            terminals_sum_current: row.try_get::<i64, _>("terminals_sum_current")? as u32,
            terminals_sum_previous: row.try_get::<i64, _>("terminals_sum_previous")? as u32,
            suggestion: row.try_get("suggestion")?,
            wins: row.try_get::<i64, _>("wins")? as u32,
            losses: row.try_get::<i64, _>("losses")? as u32,
            total_observed: row.try_get::<i64, _>("total_observed")? as u64,
            recent_numbers,
            updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
