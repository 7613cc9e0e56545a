//! Shared types for the CROUPIER monitor.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that source, strategy, storage,
//! and dashboard modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel for "no trigger recorded yet".
pub const UNSET: i8 = -1;

// ---------------------------------------------------------------------------
// Table state
// ---------------------------------------------------------------------------

/// The per-table state machine's current state.
///
/// `Morto` marks a settled round. It is transient: the analyzer folds it
/// straight back to `Neutral` within the same processing step, so it is
/// never observable between calls — the variant exists because storage and
/// API consumers share this enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableState {
    Neutral,
    Trigger,
    PostGaleNeutral,
    Morto,
}

impl fmt::Display for TableState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableState::Neutral => write!(f, "NEUTRAL"),
            TableState::Trigger => write!(f, "TRIGGER"),
            TableState::PostGaleNeutral => write!(f, "POST_GALE_NEUTRAL"),
            TableState::Morto => write!(f, "MORTO"),
        }
    }
}

impl std::str::FromStr for TableState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEUTRAL" => Ok(TableState::Neutral),
            "TRIGGER" => Ok(TableState::Trigger),
            "POST_GALE_NEUTRAL" => Ok(TableState::PostGaleNeutral),
            "MORTO" => Ok(TableState::Morto),
            _ => Err(anyhow::anyhow!("Unknown table state: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Round outcome & transitions
// ---------------------------------------------------------------------------

/// Final result of one completed round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Win,
    Loss,
}

impl fmt::Display for RoundOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundOutcome::Win => write!(f, "WIN"),
            RoundOutcome::Loss => write!(f, "LOSS"),
        }
    }
}

/// A state-machine transition, returned explicitly by the analyzer so
/// callers and tests can observe behaviour without parsing log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// NEUTRAL → TRIGGER: a new round armed on `trigger`.
    Armed { trigger: u8 },
    /// The trigger has no terminal row — the round cannot be scored.
    MissingTerminals { trigger: u8 },
    /// TRIGGER → settled: the first check hit a terminal.
    DirectWin { trigger: u8, number: u8 },
    /// TRIGGER → POST_GALE_NEUTRAL: the first check missed, one retry left.
    Gale { trigger: u8, number: u8 },
    /// POST_GALE_NEUTRAL → settled: the retry hit a terminal.
    GaleWin { trigger: u8, number: u8 },
    /// POST_GALE_NEUTRAL → settled: the retry missed, round lost.
    GaleLoss { trigger: u8, number: u8 },
    /// Settled round (MORTO) folded back to NEUTRAL.
    Reset,
}

impl Transition {
    /// The round outcome this transition records, if any.
    pub fn outcome(&self) -> Option<RoundOutcome> {
        match self {
            Transition::DirectWin { .. } | Transition::GaleWin { .. } => Some(RoundOutcome::Win),
            Transition::GaleLoss { .. } => Some(RoundOutcome::Loss),
            _ => None,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Armed { trigger } => write!(f, "armed on {trigger}"),
            Transition::MissingTerminals { trigger } => {
                write!(f, "no terminals for trigger {trigger}")
            }
            Transition::DirectWin { trigger, number } => {
                write!(f, "WIN: {number} is a terminal of {trigger}")
            }
            Transition::Gale { trigger, number } => {
                write!(f, "GALE: {number} missed the terminals of {trigger}")
            }
            Transition::GaleWin { trigger, number } => {
                write!(f, "WIN after gale: {number} is a terminal of {trigger}")
            }
            Transition::GaleLoss { trigger, number } => {
                write!(f, "LOSS: {number} missed the terminals of {trigger}")
            }
            Transition::Reset => write!(f, "reset to NEUTRAL"),
        }
    }
}

// ---------------------------------------------------------------------------
// Table status snapshot
// ---------------------------------------------------------------------------

/// Read-only projection of one table's analyzer, as persisted and served.
///
/// Terminal lists carry only the display subset (first 3); the sums cover
/// the trigger's full terminal row. `recent_numbers` is newest-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableStatus {
    pub id: String,
    pub name: String,
    pub state: TableState,
    /// Active trigger (-1 = unset).
    pub trigger_number: i8,
    /// Trigger carried into the post-gale check (-1 = unset).
    pub previous_trigger_number: i8,
    pub terminals_current: Vec<u8>,
    pub terminals_previous: Vec<u8>,
    pub terminals_sum_current: u32,
    pub terminals_sum_previous: u32,
    /// Display string of the current suggestion, e.g. `"4, 7, 8"`.
    pub suggestion: String,
    pub wins: u32,
    pub losses: u32,
    /// Count of all numbers ever ingested for this table.
    pub total_observed: u64,
    pub recent_numbers: Vec<u8>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TableStatus {
    /// Win rate as a percentage. Returns 0.0 before any round settles.
    pub fn win_rate(&self) -> f64 {
        let rounds = self.wins + self.losses;
        if rounds == 0 {
            0.0
        } else {
            (f64::from(self.wins) / f64::from(rounds)) * 100.0
        }
    }

    /// The most recently observed number, if any.
    pub fn latest_number(&self) -> Option<u8> {
        self.recent_numbers.first().copied()
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} | trigger={} | {}W/{}L ({:.1}%) | seen={}",
            self.name,
            self.state,
            self.trigger_number,
            self.wins,
            self.losses,
            self.win_rate(),
            self.total_observed,
        )
    }
}

// ---------------------------------------------------------------------------
// Poll input
// ---------------------------------------------------------------------------

/// One table's raw poll result: identifier, display name, and the freshly
/// observed draws, newest-first. Entries may be non-numeric or out of
/// range — the ingest step drops those silently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReading {
    pub id: String,
    pub name: String,
    pub draws: Vec<String>,
}

impl TableReading {
    pub fn new(id: &str, name: &str, draws: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            draws: draws.iter().map(|d| d.to_string()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for CROUPIER.
#[derive(Debug, thiserror::Error)]
pub enum CroupierError {
    #[error("Source error ({source_name}): {message}")]
    Source { source_name: String, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
