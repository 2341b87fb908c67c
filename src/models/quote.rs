//! Quote record, provider identity and data-quality scores

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream sources, in canonical priority order (used as the tie-break
/// when two providers return quotes with identical timestamps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    Yahoo,
    Fred,
    Scrape,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Yahoo => "yahoo",
            ProviderId::Fred => "fred",
            ProviderId::Scrape => "scrape",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of records flowing through the validator and cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    MarketData,
    News,
    Sentiment,
}

impl DataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::MarketData => "market_data",
            DataKind::News => "news",
            DataKind::Sentiment => "sentiment",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single canonical reading for one instrument from one provider.
///
/// Quotes are created by a provider adapter, consumed by the orchestrator
/// and never mutated afterwards. `timestamp` is the adapter's own
/// wall-clock time at the moment of the upstream call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub current: f64,
    pub previous: f64,
    pub timestamp: DateTime<Utc>,
    pub source_id: ProviderId,
}

impl Quote {
    pub fn new(symbol: impl Into<String>, current: f64, previous: f64, source_id: ProviderId) -> Self {
        Self {
            symbol: symbol.into(),
            current,
            previous,
            timestamp: Utc::now(),
            source_id,
        }
    }

    /// Percent change from previous to current, or 0 when previous is 0.
    pub fn change_percent(&self) -> f64 {
        if self.previous == 0.0 {
            0.0
        } else {
            (self.current - self.previous) / self.previous * 100.0
        }
    }

    /// Traded-instrument sanity: both values finite and non-negative.
    pub fn is_finite_non_negative(&self) -> bool {
        self.current.is_finite()
            && self.previous.is_finite()
            && self.current >= 0.0
            && self.previous >= 0.0
    }
}

/// Per-record quality scores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub completeness: f64,
    pub timeliness: f64,
    pub consistency: f64,
    pub accuracy: f64,
}

impl QualityMetrics {
    pub fn perfect() -> Self {
        Self {
            completeness: 1.0,
            timeliness: 1.0,
            consistency: 1.0,
            accuracy: 1.0,
        }
    }
}
