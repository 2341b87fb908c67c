//! Shared data models spanning the aggregation layers.

pub mod quote;
pub mod snapshot;

pub use quote::{DataKind, ProviderId, QualityMetrics, Quote};
pub use snapshot::{MarketSnapshot, SnapshotEntry};
