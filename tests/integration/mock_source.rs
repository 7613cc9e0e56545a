//! Mock number source for integration testing.
//!
//! Provides a deterministic `NumberSource` implementation that serves a
//! scripted sequence of poll results — all in-memory with no external
//! dependencies.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use croupier::source::NumberSource;
use croupier::types::TableReading;

/// A mock source that pops one scripted cycle per fetch.
///
/// Once the script is exhausted it keeps serving the final cycle,
/// mimicking a feed whose numbers have stopped changing.
pub struct MockSource {
    script: Mutex<VecDeque<Vec<TableReading>>>,
    last: Mutex<Vec<TableReading>>,
    /// If set, all fetches will return this error.
    force_error: Mutex<Option<String>>,
}

impl MockSource {
    pub fn new(cycles: Vec<Vec<TableReading>>) -> Self {
        Self {
            script: Mutex::new(cycles.into()),
            last: Mutex::new(Vec::new()),
            force_error: Mutex::new(None),
        }
    }

    /// Force all subsequent fetches to return an error.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    /// Clear any forced error.
    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }
}

#[async_trait]
impl NumberSource for MockSource {
    async fn fetch_tables(&self) -> Result<Vec<TableReading>> {
        if let Some(err) = self.force_error.lock().unwrap().as_ref() {
            return Err(anyhow!("{}", err));
        }

        let mut last = self.last.lock().unwrap();
        if let Some(cycle) = self.script.lock().unwrap().pop_front() {
            *last = cycle;
        }
        Ok(last.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_serves_script_in_order() {
        let source = MockSource::new(vec![
            vec![TableReading::new("t1", "Table One", &["17"])],
            vec![TableReading::new("t1", "Table One", &["4", "17"])],
        ]);

        let first = source.fetch_tables().await.unwrap();
        assert_eq!(first[0].draws, vec!["17"]);

        let second = source.fetch_tables().await.unwrap();
        assert_eq!(second[0].draws, vec!["4", "17"]);
    }

    #[tokio::test]
    async fn test_mock_repeats_last_cycle_when_exhausted() {
        let source = MockSource::new(vec![vec![TableReading::new("t1", "Table One", &["12"])]]);

        source.fetch_tables().await.unwrap();
        let repeat = source.fetch_tables().await.unwrap();
        assert_eq!(repeat.len(), 1);
        assert_eq!(repeat[0].draws, vec!["12"]);
    }

    #[tokio::test]
    async fn test_mock_empty_script() {
        let source = MockSource::new(Vec::new());
        assert!(source.fetch_tables().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mock_forced_error() {
        let source = MockSource::new(vec![vec![TableReading::new("t1", "Table One", &["12"])]]);
        source.set_error("simulated feed outage");
        assert!(source.fetch_tables().await.is_err());

        source.clear_error();
        assert!(source.fetch_tables().await.is_ok());
    }

    #[test]
    fn test_mock_name() {
        assert_eq!(MockSource::new(Vec::new()).name(), "mock");
    }
}
