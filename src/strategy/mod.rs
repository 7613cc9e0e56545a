//! Strategy engine — the per-table outcome state machine and its registry.

pub mod analyzer;

pub use analyzer::{IngestReport, StrategyAnalyzer};

use std::collections::HashMap;
use tracing::info;

use crate::types::TableStatus;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Owns one [`StrategyAnalyzer`] per monitored table.
///
/// An analyzer is created the first time a table's id is observed and lives
/// until the table is explicitly removed. The registry itself is plain data:
/// the service layer wraps it in `Arc<tokio::sync::RwLock<_>>` and gives the
/// poll loop exclusive write access, so no per-table locking is needed.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: HashMap<String, StrategyAnalyzer>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one table's poll batch through its analyzer, creating the
    /// analyzer on first sight.
    pub fn ingest(&mut self, id: &str, name: &str, draws: &[String]) -> IngestReport {
        let analyzer = self.tables.entry(id.to_string()).or_insert_with(|| {
            info!(table = name, id, "New table registered");
            StrategyAnalyzer::new(id, name)
        });
        analyzer.ingest(draws)
    }

    pub fn get(&self, id: &str) -> Option<&StrategyAnalyzer> {
        self.tables.get(id)
    }

    /// Status snapshot of one table.
    pub fn status(&self, id: &str) -> Option<TableStatus> {
        self.tables.get(id).map(StrategyAnalyzer::status)
    }

    /// Status snapshots of all tables, sorted by name for stable output.
    pub fn statuses(&self) -> Vec<TableStatus> {
        let mut statuses: Vec<TableStatus> =
            self.tables.values().map(StrategyAnalyzer::status).collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }

    /// Drop a table's analyzer. Returns false if the id was unknown.
    pub fn remove(&mut self, id: &str) -> bool {
        let removed = self.tables.remove(id).is_some();
        if removed {
            info!(id, "Table removed from registry");
        }
        removed
    }

    /// Seed the registry from persisted snapshots (restart recovery).
    /// Tables already present are left untouched.
    pub fn hydrate(&mut self, snapshots: Vec<TableStatus>) -> usize {
        let mut restored = 0;
        for snapshot in snapshots {
            if !self.tables.contains_key(&snapshot.id) {
                self.tables
                    .insert(snapshot.id.clone(), StrategyAnalyzer::restore(&snapshot));
                restored += 1;
            }
        }
        if restored > 0 {
            info!(restored, "Registry hydrated from storage");
        }
        restored
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TableState, Transition};

    fn draws(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_registry_starts_empty() {
        let registry = TableRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.statuses().is_empty());
        assert!(registry.status("nope").is_none());
    }

    #[test]
    fn test_ingest_creates_analyzer_on_first_sight() {
        let mut registry = TableRegistry::new();
        let report = registry.ingest("t1", "Speed Roulette", &draws(&["17"]));
        assert!(report.any_accepted());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("t1").unwrap().name(), "Speed Roulette");
        assert_eq!(registry.status("t1").unwrap().state, TableState::Trigger);
    }

    #[test]
    fn test_ingest_reuses_existing_analyzer() {
        let mut registry = TableRegistry::new();
        registry.ingest("t1", "Speed Roulette", &draws(&["17"]));
        registry.ingest("t1", "Speed Roulette", &draws(&["4"]));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.status("t1").unwrap().wins, 1);
    }

    #[test]
    fn test_tables_are_independent() {
        let mut registry = TableRegistry::new();
        registry.ingest("t1", "Table One", &draws(&["17"]));
        registry.ingest("t2", "Table Two", &draws(&["5"]));
        registry.ingest("t1", "Table One", &draws(&["4"]));

        let one = registry.status("t1").unwrap();
        let two = registry.status("t2").unwrap();
        assert_eq!(one.wins, 1);
        assert_eq!(two.wins, 0);
        assert_eq!(two.state, TableState::Trigger);
        assert_eq!(two.trigger_number, 5);
    }

    #[test]
    fn test_ingest_report_carries_events() {
        let mut registry = TableRegistry::new();
        let report = registry.ingest("t1", "Table One", &draws(&["4", "17"]));
        assert!(report.events.contains(&Transition::Armed { trigger: 17 }));
        assert!(report
            .events
            .contains(&Transition::DirectWin { trigger: 17, number: 4 }));
    }

    #[test]
    fn test_statuses_sorted_by_name() {
        let mut registry = TableRegistry::new();
        registry.ingest("b", "Zelta", &draws(&["1"]));
        registry.ingest("a", "Alpha", &draws(&["2"]));
        let names: Vec<String> = registry.statuses().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Alpha".to_string(), "Zelta".to_string()]);
    }

    #[test]
    fn test_remove() {
        let mut registry = TableRegistry::new();
        registry.ingest("t1", "Table One", &draws(&["17"]));
        assert!(registry.remove("t1"));
        assert!(!registry.remove("t1"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_hydrate_restores_tallies() {
        let mut registry = TableRegistry::new();
        registry.ingest("t1", "Table One", &draws(&["17"]));
        registry.ingest("t1", "Table One", &draws(&["4"]));
        let snapshots = registry.statuses();

        let mut fresh = TableRegistry::new();
        assert_eq!(fresh.hydrate(snapshots), 1);
        assert_eq!(fresh.status("t1").unwrap().wins, 1);
    }

    #[test]
    fn test_hydrate_skips_existing_tables() {
        let mut registry = TableRegistry::new();
        registry.ingest("t1", "Table One", &draws(&["17"]));
        let snapshots = registry.statuses();

        registry.ingest("t1", "Table One", &draws(&["4"]));
        assert_eq!(registry.hydrate(snapshots), 0);
        // The live analyzer (with the settled win) was kept.
        assert_eq!(registry.status("t1").unwrap().wins, 1);
    }
}
