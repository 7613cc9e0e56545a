//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (the feed API key) are referenced by env-var name in the config
//! and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub monitor: MonitorConfig,
    pub source: SourceConfig,
    pub storage: StorageConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    pub name: String,
    pub poll_interval_secs: u64,
    /// Table ids to monitor. Empty means every table the feed shows.
    #[serde(default)]
    pub allowed_tables: Vec<String>,
    /// Stop after this many poll cycles (none = run until shutdown).
    #[serde(default)]
    pub max_cycles: Option<u64>,
}

impl MonitorConfig {
    /// Whether a table id passes the allow-list.
    pub fn is_table_allowed(&self, id: &str) -> bool {
        self.allowed_tables.is_empty() || self.allowed_tables.iter().any(|t| t == id)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub lobby_url: String,
    /// Env var holding the feed bearer key, if the feed requires one.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub enabled: bool,
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_db_path() -> String {
    "croupier.db".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [monitor]
        name = "CROUPIER-001"
        poll_interval_secs = 5
        allowed_tables = ["2010016", "2380335"]

        [source]
        lobby_url = "http://localhost:8787/api/lobby/tables"
        api_key_env = "LOBBY_API_KEY"

        [storage]
        enabled = true
        db_path = "croupier.db"

        [dashboard]
        enabled = true
        port = 8080
    "#;

    #[test]
    fn test_parse_sample() {
        let cfg: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.monitor.name, "CROUPIER-001");
        assert_eq!(cfg.monitor.poll_interval_secs, 5);
        assert_eq!(cfg.monitor.allowed_tables.len(), 2);
        assert!(cfg.monitor.max_cycles.is_none());
        assert_eq!(cfg.source.lobby_url, "http://localhost:8787/api/lobby/tables");
        assert_eq!(cfg.source.api_key_env.as_deref(), Some("LOBBY_API_KEY"));
        assert_eq!(cfg.source.request_timeout_secs, 30); // default
        assert!(cfg.storage.enabled);
        assert_eq!(cfg.dashboard.port, 8080);
    }

    #[test]
    fn test_defaults_when_omitted() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [monitor]
            name = "X"
            poll_interval_secs = 10

            [source]
            lobby_url = "http://feed.example.com"

            [storage]
            enabled = false

            [dashboard]
            enabled = false
            port = 9000
        "#,
        )
        .unwrap();
        assert!(cfg.monitor.allowed_tables.is_empty());
        assert!(cfg.source.api_key_env.is_none());
        assert_eq!(cfg.storage.db_path, "croupier.db");
    }

    #[test]
    fn test_allow_list() {
        let cfg: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert!(cfg.monitor.is_table_allowed("2010016"));
        assert!(!cfg.monitor.is_table_allowed("9999999"));
    }

    #[test]
    fn test_empty_allow_list_allows_all() {
        let monitor = MonitorConfig {
            name: "X".to_string(),
            poll_interval_secs: 5,
            allowed_tables: Vec::new(),
            max_cycles: None,
        };
        assert!(monitor.is_table_allowed("anything"));
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = AppConfig::load("/tmp/croupier_no_such_config_12345.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_repo_config() {
        // config.toml ships at the repo root; tests run from there.
        if let Ok(cfg) = AppConfig::load("config.toml") {
            assert!(!cfg.monitor.name.is_empty());
            assert!(cfg.monitor.poll_interval_secs > 0);
        }
        // Missing file is acceptable in some test environments.
    }
}
