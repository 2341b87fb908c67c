//! Aggregated snapshot served to API consumers and push subscribers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ProviderId, Quote};

/// One instrument's reading inside a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub current: f64,
    pub previous: f64,
    pub timestamp: DateTime<Utc>,
    pub source: ProviderId,
}

impl From<&Quote> for SnapshotEntry {
    fn from(quote: &Quote) -> Self {
        Self {
            current: quote.current,
            previous: quote.previous,
            timestamp: quote.timestamp,
            source: quote.source_id,
        }
    }
}

/// The full symbol set resolved at one refresh, plus per-symbol failures
/// for the instruments that could not be resolved this round.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub quotes: BTreeMap<String, SnapshotEntry>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub failures: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl MarketSnapshot {
    pub fn new() -> Self {
        Self {
            quotes: BTreeMap::new(),
            failures: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}
