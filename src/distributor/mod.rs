//! Validated distribution into the two cache tiers
//!
//! All data enters the caches through `publish`, which scores the record
//! first and refuses entry on rejection, leaving any previously accepted
//! value in place. Reads prefer the memory tier and fall back to the
//! durable tier after a restart.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::cache::{refresh_interval_for, ttl_for, FileCache, MemoryCache};
use crate::error::{CachePersistError, DistributionError};
use crate::models::{DataKind, QualityMetrics};
use crate::validator::DataValidator;

/// Attempts at writing the durable tier before giving up on it.
const DURABLE_WRITE_ATTEMPTS: u32 = 3;
const DURABLE_WRITE_BACKOFF: Duration = Duration::from_millis(100);

/// Persisted quality floors re-checked on every read, so records written
/// under older, looser rules cannot leak back out of the durable tier.
const READ_COMPLETENESS_FLOOR: f64 = 0.95;
const READ_TIMELINESS_FLOOR: f64 = 1.0;

/// Lifecycle of one (kind, symbol) slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Never published.
    Empty,
    /// A fetch is underway and no prior value exists.
    Fetching,
    /// Holding an accepted, unexpired record.
    Valid,
    /// The last publish attempt was rejected by validation.
    Rejected,
    /// Was valid; the ttl has since elapsed.
    Stale,
}

/// A record served out of the cache.
#[derive(Debug, Clone)]
pub struct PublishedRecord {
    pub record: Value,
    pub quality: QualityMetrics,
    pub stored_at: DateTime<Utc>,
}

pub struct DataDistributor {
    validator: DataValidator,
    memory: MemoryCache,
    durable: FileCache,
    states: Mutex<HashMap<(DataKind, String), EntryState>>,
}

impl DataDistributor {
    pub fn new(data_dir: &Path) -> Result<Self, CachePersistError> {
        Ok(Self {
            validator: DataValidator::new(),
            memory: MemoryCache::new(),
            durable: FileCache::new(data_dir)?,
            states: Mutex::new(HashMap::new()),
        })
    }

    /// Validates and, on acceptance, writes both tiers. A durable-tier
    /// failure is logged and absorbed; the memory tier already holds the
    /// record, so the publish still succeeds.
    pub async fn publish(
        &self,
        kind: DataKind,
        symbol: &str,
        record: Value,
    ) -> Result<QualityMetrics, DistributionError> {
        let historical = self.read(kind, symbol).map(|p| p.record);
        let outcome = self.validator.validate(kind, &record, historical.as_ref());

        if !outcome.accepted {
            warn!(
                kind = %kind,
                symbol,
                reasons = ?outcome.reasons,
                "rejecting record, cached value left untouched"
            );
            self.set_state(kind, symbol, EntryState::Rejected);
            return Err(DistributionError::ValidationRejected {
                reasons: outcome.reasons,
                metrics: outcome.metrics,
            });
        }

        let metrics = outcome.metrics;
        let envelope = json!({ "record": record, "quality": metrics });
        let ttl = ttl_for(kind);
        self.memory.put(kind, symbol, envelope.clone(), ttl, metrics);
        self.set_state(kind, symbol, EntryState::Valid);

        let mut last_err: Option<CachePersistError> = None;
        for attempt in 1..=DURABLE_WRITE_ATTEMPTS {
            match self.durable.put(kind, symbol, &envelope) {
                Ok(()) => {
                    last_err = None;
                    break;
                }
                Err(err) => {
                    debug!(kind = %kind, symbol, attempt, error = %err, "durable cache write failed");
                    last_err = Some(err);
                    if attempt < DURABLE_WRITE_ATTEMPTS {
                        sleep(DURABLE_WRITE_BACKOFF * attempt).await;
                    }
                }
            }
        }
        if let Some(err) = last_err {
            error!(kind = %kind, symbol, error = %err, "durable cache tier unavailable, serving from memory only");
        }

        Ok(metrics)
    }

    /// Memory tier first; falls back to the durable tier, repopulating
    /// memory on a durable hit so later reads stay cheap.
    pub fn read(&self, kind: DataKind, symbol: &str) -> Option<PublishedRecord> {
        if let Some(entry) = self.memory.get(kind, symbol) {
            if let Some(published) = unwrap_envelope(&entry.payload, entry.stored_at) {
                return Some(published);
            }
        }

        let ttl = ttl_for(kind);
        let stored = self.durable.get(kind, symbol, ttl)?;
        let published = unwrap_envelope(&stored.data, stored.stored_at)?;
        let remaining = ttl.saturating_sub(
            (Utc::now() - published.stored_at)
                .to_std()
                .unwrap_or(Duration::ZERO),
        );
        if !remaining.is_zero() {
            self.memory
                .put(kind, symbol, stored.data, remaining, published.quality);
        }
        Some(published)
    }

    /// Whether the background loop should proactively re-fetch this slot.
    pub fn should_refresh(&self, kind: DataKind, symbol: &str) -> bool {
        match self.read(kind, symbol) {
            None => true,
            Some(published) => {
                let age = (Utc::now() - published.stored_at)
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                age >= refresh_interval_for(kind)
            }
        }
    }

    pub fn mark_fetching(&self, kind: DataKind, symbol: &str) {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        states
            .entry((kind, symbol.to_string()))
            .or_insert(EntryState::Fetching);
    }

    pub fn state(&self, kind: DataKind, symbol: &str) -> EntryState {
        let states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        let recorded = states
            .get(&(kind, symbol.to_string()))
            .copied()
            .unwrap_or(EntryState::Empty);
        match recorded {
            EntryState::Valid if self.memory.get(kind, symbol).is_none() => {
                // Expired from memory and possibly from disk too.
                if self.read(kind, symbol).is_some() {
                    EntryState::Valid
                } else {
                    EntryState::Stale
                }
            }
            other => other,
        }
    }

    fn set_state(&self, kind: DataKind, symbol: &str, state: EntryState) {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        states.insert((kind, symbol.to_string()), state);
    }
}

fn unwrap_envelope(envelope: &Value, stored_at: DateTime<Utc>) -> Option<PublishedRecord> {
    let record = envelope.get("record")?.clone();
    let quality: QualityMetrics = serde_json::from_value(envelope.get("quality")?.clone()).ok()?;
    if quality.completeness < READ_COMPLETENESS_FLOOR || quality.timeliness < READ_TIMELINESS_FLOOR
    {
        return None;
    }
    Some(PublishedRecord {
        record,
        quality,
        stored_at,
    })
}
