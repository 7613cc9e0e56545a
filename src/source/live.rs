//! Live casino lobby feed.
//!
//! Polls the lobby's JSON feed for the set of visible roulette tables and
//! the latest drawn numbers of each. The feed is consumed as a black box:
//! how the numbers get onto it (page scraping, operator API) is not this
//! module's concern.
//!
//! Payload shape: a JSON array of tables, e.g.
//! `[{"id": "2010016", "name": "Ruleta en Vivo", "draws": ["4", "17"]}]`.
//! Ids and draws arrive as strings or bare numbers depending on the feed
//! version, so parsing is deliberately tolerant; anything non-numeric is
//! passed through and dropped later at ingest.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use super::NumberSource;
use crate::types::{CroupierError, TableReading};

const SOURCE_NAME: &str = "live-casino";

// ---------------------------------------------------------------------------
// Wire types (feed JSON → Rust)
// ---------------------------------------------------------------------------

/// One lobby entry. Only the fields we need are deserialized.
#[derive(Debug, Deserialize)]
struct LobbyTable {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default, alias = "title")]
    name: String,
    #[serde(default, alias = "numbers")]
    draws: Vec<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the lobby feed.
pub struct LiveCasinoSource {
    http: Client,
    feed_url: String,
    /// Optional bearer key for feeds that gate access.
    api_key: Option<SecretString>,
}

impl LiveCasinoSource {
    /// Create a new lobby feed client.
    ///
    /// When `tables` is non-empty the feed is asked to filter server-side,
    /// mirroring the monitor's allow-list.
    pub fn new(
        lobby_url: &str,
        tables: &[String],
        api_key: Option<SecretString>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent("CROUPIER/0.1.0 (live-table-monitor)")
            .build()
            .context("Failed to build HTTP client for the lobby feed")?;

        Ok(Self {
            http,
            feed_url: Self::feed_url(lobby_url, tables),
            api_key,
        })
    }

    /// Build the feed URL, appending a `tables` filter when one is set.
    fn feed_url(lobby_url: &str, tables: &[String]) -> String {
        let base = lobby_url.trim_end_matches('/');
        if tables.is_empty() {
            base.to_string()
        } else {
            format!("{base}?tables={}", urlencoding::encode(&tables.join(",")))
        }
    }

    /// Convert a lobby entry into a reading. Entries without a usable id
    /// are skipped — there is nothing stable to key an analyzer on.
    fn to_reading(entry: LobbyTable) -> Option<TableReading> {
        let id = match entry.id {
            Some(serde_json::Value::String(s)) if !s.is_empty() => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => {
                warn!(table = %entry.name, "Lobby entry without usable id, skipping");
                return None;
            }
        };

        let draws = entry.draws.iter().filter_map(Self::draw_text).collect();
        Some(TableReading {
            id,
            name: entry.name,
            draws,
        })
    }

    fn draw_text(value: &serde_json::Value) -> Option<String> {
        match value {
            serde_json::Value::String(s) => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[async_trait]
impl NumberSource for LiveCasinoSource {
    async fn fetch_tables(&self) -> Result<Vec<TableReading>> {
        debug!(url = %self.feed_url, "Fetching lobby feed");

        let mut request = self.http.get(&self.feed_url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let resp = request.send().await.context("Lobby feed request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(CroupierError::Source {
                source_name: SOURCE_NAME.to_string(),
                message: format!("HTTP {status}: {body}"),
            }
            .into());
        }

        let entries: Vec<LobbyTable> = resp
            .json()
            .await
            .context("Failed to parse lobby feed response")?;

        let readings: Vec<TableReading> =
            entries.into_iter().filter_map(Self::to_reading).collect();
        debug!(tables = readings.len(), "Lobby feed fetched");
        Ok(readings)
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
