//! Per-provider API usage accounting
//!
//! Counts calls and errors per provider in hourly buckets and persists
//! the counters to disk on every mutation, so usage survives restarts
//! and stays inspectable from outside the process. A flush failure is
//! logged and absorbed; accounting must never fail a fetch.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::warn;

use crate::models::ProviderId;

const USAGE_FILE: &str = "api_usage.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderStats {
    pub calls: u64,
    pub errors: u64,
    /// Start of the current hourly bucket.
    pub last_reset: DateTime<Utc>,
}

impl ProviderStats {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            calls: 0,
            errors: 0,
            last_reset: now,
        }
    }

    pub fn error_rate(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.errors as f64 / self.calls as f64
        }
    }
}

/// Usage view surfaced over the HTTP API.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderUsage {
    pub calls: u64,
    pub errors: u64,
    pub error_rate: f64,
    pub last_reset: DateTime<Utc>,
}

pub struct ApiUsageMonitor {
    path: PathBuf,
    stats: Mutex<HashMap<ProviderId, ProviderStats>>,
}

impl ApiUsageMonitor {
    /// Loads persisted counters from `data_dir` if present.
    pub fn new(data_dir: &Path) -> Self {
        let path = data_dir.join(USAGE_FILE);
        let stats = load_stats(&path).unwrap_or_default();
        Self {
            path,
            stats: Mutex::new(stats),
        }
    }

    /// Records one upstream call. Rolls the hourly bucket over first if
    /// it has aged out, then flushes the counters to disk.
    pub async fn record(&self, provider: ProviderId, success: bool) {
        let now = Utc::now();
        let snapshot = {
            let mut stats = self.stats.lock().await;
            let entry = stats
                .entry(provider)
                .or_insert_with(|| ProviderStats::fresh(now));
            if now - entry.last_reset >= ChronoDuration::hours(1) {
                *entry = ProviderStats::fresh(now);
            }
            entry.calls += 1;
            if !success {
                entry.errors += 1;
            }
            stats.clone()
        };

        if let Err(err) = persist_stats(&self.path, &snapshot) {
            warn!(path = %self.path.display(), error = %err, "failed to persist api usage counters");
        }
    }

    pub async fn stats(&self) -> HashMap<String, ProviderUsage> {
        let stats = self.stats.lock().await;
        stats
            .iter()
            .map(|(provider, s)| {
                (
                    provider.to_string(),
                    ProviderUsage {
                        calls: s.calls,
                        errors: s.errors,
                        error_rate: s.error_rate(),
                        last_reset: s.last_reset,
                    },
                )
            })
            .collect()
    }
}

fn load_stats(path: &Path) -> Option<HashMap<ProviderId, ProviderStats>> {
    let bytes = fs::read(path).ok()?;
    match serde_json::from_slice(&bytes) {
        Ok(stats) => Some(stats),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring unreadable usage file");
            None
        }
    }
}

fn persist_stats(path: &Path, stats: &HashMap<ProviderId, ProviderStats>) -> io::Result<()> {
    let bytes = serde_json::to_vec_pretty(stats)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}
