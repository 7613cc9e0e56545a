//! Per-table outcome state machine.
//!
//! One `StrategyAnalyzer` per monitored table, exclusive owner of its
//! fields. Each observed number advances a four-state automaton:
//!
//! - NEUTRAL: the number becomes the round's trigger → TRIGGER.
//! - TRIGGER: the number is checked against the trigger's terminals —
//!   a hit settles the round as a win, a miss grants one "gale" retry
//!   → POST_GALE_NEUTRAL.
//! - POST_GALE_NEUTRAL: the retry is checked against the same terminal
//!   set; hit = win, miss = loss. The round settles either way.
//! - MORTO: a settled round. Transient — folded back to NEUTRAL within
//!   the same processing step, so it never consumes a number and is
//!   never observable between calls.
//!
//! A round is therefore exactly two or three numbers and produces exactly
//! one win or loss. Transitions are returned as explicit events rather
//! than signalled through the log stream.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::terminals;
use crate::types::{TableState, TableStatus, Transition, UNSET};

/// Numbers kept for display; win/loss totals use the unbounded counter.
pub const MAX_HISTORY: usize = 20;

/// Numbers exposed in the status snapshot.
pub const RECENT_LEN: usize = 5;

/// Result of feeding one poll batch through an analyzer.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// How many values were accepted (valid, not duplicate reads).
    pub accepted: usize,
    /// Every transition produced by the accepted values, in order.
    pub events: Vec<Transition>,
}

impl IngestReport {
    pub fn any_accepted(&self) -> bool {
        self.accepted > 0
    }

    fn merge(&mut self, events: Vec<Transition>) {
        self.accepted += 1;
        self.events.extend(events);
    }
}

/// The per-table state machine plus its running tally and history.
#[derive(Debug, Clone)]
pub struct StrategyAnalyzer {
    id: String,
    name: String,
    state: TableState,
    trigger_number: i8,
    previous_trigger_number: i8,
    wins: u32,
    losses: u32,
    total_observed: u64,
    /// Newest-first, capped at [`MAX_HISTORY`].
    numbers: Vec<u8>,
    last_update: Option<DateTime<Utc>>,
}

impl StrategyAnalyzer {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            state: TableState::Neutral,
            trigger_number: UNSET,
            previous_trigger_number: UNSET,
            wins: 0,
            losses: 0,
            total_observed: 0,
            numbers: Vec::new(),
            last_update: None,
        }
    }

    /// Rebuild an analyzer from a persisted snapshot so tallies and the
    /// in-flight round survive a restart.
    pub fn restore(status: &TableStatus) -> Self {
        Self {
            id: status.id.clone(),
            name: status.name.clone(),
            // Snapshots never carry MORTO, but fold it if one ever does.
            state: match status.state {
                TableState::Morto => TableState::Neutral,
                other => other,
            },
            trigger_number: status.trigger_number,
            previous_trigger_number: status.previous_trigger_number,
            wins: status.wins,
            losses: status.losses,
            total_observed: status.total_observed,
            numbers: status.recent_numbers.clone(),
            last_update: status.updated_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> TableState {
        self.state
    }

    pub fn wins(&self) -> u32 {
        self.wins
    }

    pub fn losses(&self) -> u32 {
        self.losses
    }

    /// Feed one poll batch (newest-first) through the state machine.
    ///
    /// The first time a table is seen its batch is replayed oldest-first so
    /// rounds are judged in true observation order; on later polls only the
    /// newest entry can be fresh. Non-numeric and off-wheel values are
    /// dropped, and a value equal to the most recently recorded number is
    /// treated as a repeated read of the same physical result.
    pub fn ingest(&mut self, draws: &[String]) -> IngestReport {
        let mut report = IngestReport::default();
        if draws.is_empty() {
            return report;
        }

        if self.total_observed == 0 {
            for draw in draws.iter().rev() {
                self.accept(draw, &mut report);
            }
        } else if let Some(newest) = draws.first() {
            self.accept(newest, &mut report);
        }

        if report.any_accepted() {
            self.last_update = Some(Utc::now());
        }
        report
    }

    fn accept(&mut self, raw: &str, report: &mut IngestReport) {
        let number: u8 = match raw.trim().parse() {
            Ok(n) if n <= terminals::WHEEL_MAX => n,
            _ => {
                debug!(table = %self.name, draw = raw, "Dropping invalid draw");
                return;
            }
        };

        if self.numbers.first() == Some(&number) {
            debug!(table = %self.name, number, "Duplicate read, skipping");
            return;
        }

        self.numbers.insert(0, number);
        self.numbers.truncate(MAX_HISTORY);
        self.total_observed += 1;

        report.merge(self.process(number));
    }

    /// Advance the state machine by one observed number.
    ///
    /// Pure in-memory computation — no I/O, no blocking. The caller is
    /// responsible for range-checking the input (see [`Self::ingest`]).
    pub fn process(&mut self, number: u8) -> Vec<Transition> {
        debug!(table = %self.name, number, state = %self.state, "Processing number");
        let mut events = Vec::new();

        match self.state {
            // Unreachable between calls; fold defensively and re-arm.
            TableState::Morto => {
                self.state = TableState::Neutral;
                events.push(Transition::Reset);
                self.arm(number, &mut events);
            }
            TableState::Neutral => self.arm(number, &mut events),
            TableState::Trigger => match terminals::lookup(self.trigger_number) {
                Some(terms) if terms.contains(&number) => {
                    self.wins += 1;
                    events.push(Transition::DirectWin {
                        trigger: self.trigger_number as u8,
                        number,
                    });
                    self.settle(&mut events);
                }
                Some(_) => {
                    self.previous_trigger_number = self.trigger_number;
                    self.state = TableState::PostGaleNeutral;
                    events.push(Transition::Gale {
                        trigger: self.trigger_number as u8,
                        number,
                    });
                }
                None => {
                    warn!(
                        table = %self.name,
                        trigger = self.trigger_number,
                        "Trigger has no terminal row, round not scored"
                    );
                    events.push(Transition::MissingTerminals {
                        trigger: self.trigger_number.max(0) as u8,
                    });
                    self.settle(&mut events);
                }
            },
            TableState::PostGaleNeutral => {
                match terminals::lookup(self.previous_trigger_number) {
                    Some(terms) => {
                        if terms.contains(&number) {
                            self.wins += 1;
                            events.push(Transition::GaleWin {
                                trigger: self.previous_trigger_number as u8,
                                number,
                            });
                        } else {
                            self.losses += 1;
                            events.push(Transition::GaleLoss {
                                trigger: self.previous_trigger_number as u8,
                                number,
                            });
                        }
                    }
                    None => {
                        warn!(
                            table = %self.name,
                            trigger = self.previous_trigger_number,
                            "Previous trigger has no terminal row, round not scored"
                        );
                        events.push(Transition::MissingTerminals {
                            trigger: self.previous_trigger_number.max(0) as u8,
                        });
                    }
                }
                self.settle(&mut events);
            }
        }

        events
    }

    fn arm(&mut self, number: u8, events: &mut Vec<Transition>) {
        self.trigger_number = number as i8;
        self.state = TableState::Trigger;

        if terminals::lookup(self.trigger_number).is_some() {
            events.push(Transition::Armed { trigger: number });
        } else {
            warn!(table = %self.name, trigger = number, "Trigger not found in terminal table");
            events.push(Transition::MissingTerminals { trigger: number });
        }
    }

    /// The round is dead (MORTO). Fold straight back to NEUTRAL so the
    /// dead state never consumes a number and is never observable.
    fn settle(&mut self, events: &mut Vec<Transition>) {
        self.state = TableState::Neutral;
        events.push(Transition::Reset);
    }

    /// Read-only status projection. Idempotent; valid at any point,
    /// including immediately after construction.
    pub fn status(&self) -> TableStatus {
        let suggestion = terminals::suggestion(self.trigger_number);

        TableStatus {
            id: self.id.clone(),
            name: self.name.clone(),
            state: self.state,
            trigger_number: self.trigger_number,
            previous_trigger_number: self.previous_trigger_number,
            terminals_current: suggestion.to_vec(),
            terminals_previous: terminals::suggestion(self.previous_trigger_number).to_vec(),
            terminals_sum_current: terminals::sum(self.trigger_number),
            terminals_sum_previous: terminals::sum(self.previous_trigger_number),
            suggestion: suggestion
                .iter()
                .map(u8::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            wins: self.wins,
            losses: self.losses,
            total_observed: self.total_observed,
            recent_numbers: self.numbers.iter().take(RECENT_LEN).copied().collect(),
            updated_at: self.last_update,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
