//! Number sources.
//!
//! Defines the `NumberSource` trait and provides the live lobby feed
//! implementation. A source produces, per poll, the set of visible tables
//! and each table's freshly drawn numbers; everything downstream of the
//! trait is source-agnostic.

pub mod live;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::TableReading;

/// Abstraction over where roulette numbers come from.
///
/// Implementors are polled by the monitor once per cycle. A fetch failure
/// fails that cycle only — the poll loop logs it and carries on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NumberSource: Send + Sync {
    /// Fetch all currently visible tables with their latest draws
    /// (newest-first).
    async fn fetch_tables(&self) -> Result<Vec<TableReading>>;

    /// Source name for logging and identification.
    fn name(&self) -> &str;
}
