//! Resilient multi-source market data aggregation.
//!
//! Quotes are fetched concurrently from several upstream providers,
//! rate limited and retried per provider, validated against quality
//! thresholds, cached in two tiers and pushed to subscribers over
//! WebSockets.

pub mod cache;
pub mod config;
pub mod core;
pub mod distributor;
pub mod error;
pub mod limiter;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod monitor;
pub mod orchestrator;
pub mod providers;
pub mod retry;
pub mod service;
pub mod validator;
