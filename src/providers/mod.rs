//! Provider adapters behind a single trait
//!
//! Each adapter does exactly one upstream call per `fetch` and maps the
//! response into a `Quote`. No retries, no rate limiting, no caching in
//! here; the orchestrator composes those around the adapters.

pub mod catalog;
pub mod fred;
pub mod scrape;
pub mod yahoo;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use crate::error::FetchError;
use crate::models::{ProviderId, Quote};

pub use fred::FredAdapter;
pub use scrape::ScrapeAdapter;
pub use yahoo::YahooAdapter;

/// One upstream data source.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Whether this adapter has an upstream identifier for `symbol`.
    fn supports(&self, symbol: &str) -> bool;

    /// One attempt against the upstream. Must not sleep or retry.
    async fn fetch(&self, symbol: &str) -> Result<Quote, FetchError>;
}

/// Builds the adapter registry in canonical priority order. The FRED
/// adapter is only registered when an API key is configured.
pub fn build_registry(config: &Config, client: reqwest::Client) -> Vec<Arc<dyn ProviderAdapter>> {
    let mut registry: Vec<Arc<dyn ProviderAdapter>> =
        vec![Arc::new(YahooAdapter::new(client.clone()))];

    if let Some(key) = &config.fred_api_key {
        registry.push(Arc::new(FredAdapter::new(client.clone(), key.clone())));
    } else {
        tracing::warn!("FRED_API_KEY not set, fred adapter disabled");
    }

    registry.push(Arc::new(ScrapeAdapter::new(
        client,
        &config.scrape_proxies,
        config.request_timeout,
    )));

    registry
}
