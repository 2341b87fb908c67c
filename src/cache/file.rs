//! Durable file-backed cache tier
//!
//! One JSON file per (kind, symbol). Writes go through a temp file and
//! an atomic rename so a crash mid-write never leaves a truncated
//! record behind.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::error::CachePersistError;
use crate::models::DataKind;

/// A record read back from disk along with when it was written.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub data: Value,
    pub stored_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Creates the cache directory if missing.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CachePersistError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(CachePersistError)?;
        Ok(Self { dir })
    }

    fn path_for(&self, kind: DataKind, symbol: &str) -> PathBuf {
        let safe: String = symbol
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.dir.join(format!("{}_{}.json", kind.as_str(), safe))
    }

    /// Persists `data` wrapped in a timestamped envelope.
    pub fn put(&self, kind: DataKind, symbol: &str, data: &Value) -> Result<(), CachePersistError> {
        let envelope = json!({
            "timestamp": Utc::now().timestamp_millis() as f64 / 1000.0,
            "data": data,
        });
        let bytes = serde_json::to_vec(&envelope)
            .map_err(|e| CachePersistError(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        write_atomic(&self.path_for(kind, symbol), &bytes).map_err(CachePersistError)
    }

    /// Reads a record back if it exists and is younger than `ttl`.
    /// Unreadable or corrupt files are treated as misses, not errors.
    pub fn get(&self, kind: DataKind, symbol: &str, ttl: Duration) -> Option<StoredRecord> {
        let path = self.path_for(kind, symbol);
        let bytes = fs::read(&path).ok()?;
        let envelope: Value = match serde_json::from_slice(&bytes) {
            Ok(v) => v,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "discarding corrupt cache file");
                let _ = fs::remove_file(&path);
                return None;
            }
        };

        let epoch = envelope.get("timestamp")?.as_f64()?;
        let stored_at = Utc.timestamp_millis_opt((epoch * 1000.0) as i64).single()?;
        let age = (Utc::now() - stored_at).to_std().unwrap_or(Duration::ZERO);
        if age >= ttl {
            return None;
        }

        Some(StoredRecord {
            data: envelope.get("data")?.clone(),
            stored_at,
        })
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}
