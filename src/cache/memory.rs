//! In-memory cache tier

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::models::{DataKind, QualityMetrics};

/// One cached record with the quality scores it was admitted under.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: Value,
    pub stored_at: DateTime<Utc>,
    pub ttl: Duration,
    pub quality: QualityMetrics,
}

impl CacheEntry {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.stored_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Expired exactly at the ttl boundary, not after it.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.age(now) >= self.ttl
    }
}

/// Process-local tier. A plain mutex is enough; entries are small and
/// the critical sections are a lookup or an insert.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<(DataKind, String), CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a live entry, evicting it if expired.
    pub fn get(&self, kind: DataKind, symbol: &str) -> Option<CacheEntry> {
        let now = Utc::now();
        let key = (kind, symbol.to_string());
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(&key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub fn put(
        &self,
        kind: DataKind,
        symbol: &str,
        payload: Value,
        ttl: Duration,
        quality: QualityMetrics,
    ) {
        let entry = CacheEntry {
            payload,
            stored_at: Utc::now(),
            ttl,
            quality,
        };
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert((kind, symbol.to_string()), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
