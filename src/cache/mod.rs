//! Two-tier cache: a process-local memory tier in front of a durable
//! file tier that survives restarts.
//!
//! The tiers are independent. A durable write failure never invalidates
//! the memory tier, and a cold start serves straight from disk until the
//! first refresh repopulates memory.

pub mod file;
pub mod memory;

use std::time::Duration;

use crate::models::DataKind;

pub use file::FileCache;
pub use memory::{CacheEntry, MemoryCache};

/// Cache lifetime per record kind. Market data churns, news less so,
/// sentiment is slow-moving.
pub fn ttl_for(kind: DataKind) -> Duration {
    match kind {
        DataKind::MarketData => Duration::from_secs(900),
        DataKind::News => Duration::from_secs(1800),
        DataKind::Sentiment => Duration::from_secs(3600),
    }
}

/// How often the refresh loop considers a record of this kind stale
/// enough to re-fetch proactively.
pub fn refresh_interval_for(kind: DataKind) -> Duration {
    match kind {
        DataKind::MarketData => Duration::from_secs(300),
        DataKind::News => Duration::from_secs(1800),
        DataKind::Sentiment => Duration::from_secs(3600),
    }
}
