//! End-to-end simulation.
//!
//! Replays scripted lobby feeds through the full fetch→analyze→persist
//! pipeline and checks the resulting tallies, snapshots, and restart
//! recovery — no network, no real casino.

use std::sync::Arc;
use tokio::sync::RwLock;

use croupier::config::MonitorConfig;
use croupier::monitor::Monitor;
use croupier::storage::Store;
use croupier::strategy::TableRegistry;
use croupier::types::{TableReading, TableState};

use super::mock_source::MockSource;

fn config(allowed: &[&str]) -> MonitorConfig {
    MonitorConfig {
        name: "CROUPIER-SIM".to_string(),
        poll_interval_secs: 1,
        allowed_tables: allowed.iter().map(|s| s.to_string()).collect(),
        max_cycles: None,
    }
}

/// Three polls of a two-table lobby:
/// - "ruleta-1" wins directly (17 then 4),
/// - "ruleta-2" goes through a gale and loses (5, 1, 2).
fn scripted_lobby() -> MockSource {
    MockSource::new(vec![
        vec![
            TableReading::new("ruleta-1", "Ruleta en Vivo", &["17"]),
            TableReading::new("ruleta-2", "Speed Roulette", &["5"]),
        ],
        vec![
            TableReading::new("ruleta-1", "Ruleta en Vivo", &["4", "17"]),
            TableReading::new("ruleta-2", "Speed Roulette", &["1", "5"]),
        ],
        vec![
            TableReading::new("ruleta-1", "Ruleta en Vivo", &["4", "17"]),
            TableReading::new("ruleta-2", "Speed Roulette", &["2", "1", "5"]),
        ],
    ])
}

#[tokio::test]
async fn test_full_pipeline_settles_rounds() {
    let registry = Arc::new(RwLock::new(TableRegistry::new()));
    let store = Store::in_memory().await.unwrap();
    let mut monitor = Monitor::new(
        Box::new(scripted_lobby()),
        registry.clone(),
        Some(store),
        config(&[]),
    );

    let r1 = monitor.run_cycle().await.unwrap();
    assert_eq!(r1.tables_seen, 2);
    assert_eq!(r1.tables_updated, 2);
    assert_eq!(r1.rounds_won + r1.rounds_lost, 0);

    let r2 = monitor.run_cycle().await.unwrap();
    assert_eq!(r2.rounds_won, 1); // ruleta-1: 4 hit the terminals of 17

    let r3 = monitor.run_cycle().await.unwrap();
    assert_eq!(r3.rounds_lost, 1); // ruleta-2: 2 missed the terminals of 5
    assert_eq!(r3.tables_updated, 1); // ruleta-1's feed did not change

    let registry = registry.read().await;
    let one = registry.status("ruleta-1").unwrap();
    assert_eq!(one.wins, 1);
    assert_eq!(one.losses, 0);
    assert_eq!(one.state, TableState::Neutral);
    assert_eq!(one.recent_numbers, vec![4, 17]);

    let two = registry.status("ruleta-2").unwrap();
    assert_eq!(two.wins, 0);
    assert_eq!(two.losses, 1);
    assert_eq!(two.recent_numbers, vec![2, 1, 5]);
}

#[tokio::test]
async fn test_snapshots_persisted_each_cycle() {
    let registry = Arc::new(RwLock::new(TableRegistry::new()));
    let store = Store::in_memory().await.unwrap();
    let mut monitor = Monitor::new(
        Box::new(scripted_lobby()),
        registry,
        Some(store),
        config(&[]),
    );

    monitor.run_cycle().await.unwrap();
    monitor.run_cycle().await.unwrap();

    let persisted = monitor.store().unwrap().fetch_all().await.unwrap();
    assert_eq!(persisted.len(), 2);
    let one = persisted.iter().find(|s| s.id == "ruleta-1").unwrap();
    assert_eq!(one.wins, 1);
    assert_eq!(one.state, TableState::Neutral);
}

#[tokio::test]
async fn test_restart_resumes_tallies() {
    // First run against a file-backed store: one direct win for ruleta-1.
    let mut db_path = std::env::temp_dir();
    db_path.push(format!("croupier_sim_{}.db", uuid::Uuid::new_v4()));
    let db_path = db_path.to_string_lossy().to_string();

    {
        let registry = Arc::new(RwLock::new(TableRegistry::new()));
        let store = Store::open(&db_path).await.unwrap();
        let source = MockSource::new(vec![
            vec![TableReading::new("ruleta-1", "Ruleta en Vivo", &["17"])],
            vec![TableReading::new("ruleta-1", "Ruleta en Vivo", &["4", "17"])],
        ]);
        let mut monitor = Monitor::new(Box::new(source), registry, Some(store), config(&[]));
        monitor.run_cycle().await.unwrap();
        monitor.run_cycle().await.unwrap();
    }

    // "Restart": a fresh registry hydrated from the same database file.
    let store = Store::open(&db_path).await.unwrap();
    let registry = Arc::new(RwLock::new(TableRegistry::new()));
    let snapshots = store.fetch_all().await.unwrap();
    assert_eq!(registry.write().await.hydrate(snapshots), 1);

    // The feed repeats the last numbers, then a new round settles as a loss.
    let source = MockSource::new(vec![
        vec![TableReading::new("ruleta-1", "Ruleta en Vivo", &["4", "17"])],
        vec![TableReading::new("ruleta-1", "Ruleta en Vivo", &["5", "4", "17"])],
        vec![TableReading::new("ruleta-1", "Ruleta en Vivo", &["1", "5", "4"])],
        vec![TableReading::new("ruleta-1", "Ruleta en Vivo", &["2", "1", "5"])],
    ]);
    let mut monitor = Monitor::new(Box::new(source), registry.clone(), Some(store), config(&[]));

    let r1 = monitor.run_cycle().await.unwrap();
    assert_eq!(r1.numbers_accepted, 0); // duplicate of the restored state

    for _ in 0..3 {
        monitor.run_cycle().await.unwrap();
    }

    let status = registry.read().await.status("ruleta-1").unwrap();
    assert_eq!(status.wins, 1); // carried over from the first run
    assert_eq!(status.losses, 1); // 5 armed, 1 missed, 2 missed
    assert_eq!(status.total_observed, 5);

    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_allow_list_respected_end_to_end() {
    let registry = Arc::new(RwLock::new(TableRegistry::new()));
    let mut monitor = Monitor::new(
        Box::new(scripted_lobby()),
        registry.clone(),
        None,
        config(&["ruleta-2"]),
    );

    for _ in 0..3 {
        monitor.run_cycle().await.unwrap();
    }

    let registry = registry.read().await;
    assert!(registry.status("ruleta-1").is_none());
    assert_eq!(registry.status("ruleta-2").unwrap().losses, 1);
}

#[tokio::test]
async fn test_feed_outage_recovers() {
    let registry = Arc::new(RwLock::new(TableRegistry::new()));
    let source = MockSource::new(vec![vec![TableReading::new("t1", "Table", &["17"])]]);
    // The outage is injected before the source is handed to the monitor.
    source.set_error("lobby unreachable");
    let mut monitor = Monitor::new(Box::new(source), registry.clone(), None, config(&[]));

    assert!(monitor.run_cycle().await.is_err());
    assert!(registry.read().await.is_empty());
}

#[tokio::test]
async fn test_invalid_feed_values_never_reach_the_machine() {
    let registry = Arc::new(RwLock::new(TableRegistry::new()));
    let source = MockSource::new(vec![vec![TableReading::new(
        "t1",
        "Noisy Table",
        &["banana", "99", "-3", "17"],
    )]]);
    let mut monitor = Monitor::new(Box::new(source), registry.clone(), None, config(&[]));

    let report = monitor.run_cycle().await.unwrap();
    assert_eq!(report.numbers_accepted, 1);

    let status = registry.read().await.status("t1").unwrap();
    assert_eq!(status.recent_numbers, vec![17]);
    assert_eq!(status.state, TableState::Trigger);
}
