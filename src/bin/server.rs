//! Macrofeed Server
//!
//! Aggregates market data from the configured providers, keeps the
//! catalogue fresh in the background and serves it over HTTP and
//! WebSocket push.

use dotenvy::dotenv;
use macrofeed::config::Config;
use macrofeed::core::http::{start_server, AppState, HealthStatus};
use macrofeed::core::push::PushHub;
use macrofeed::core::scheduler::RefreshScheduler;
use macrofeed::distributor::DataDistributor;
use macrofeed::limiter::{RateLimit, RateLimiter};
use macrofeed::logging;
use macrofeed::metrics::Metrics;
use macrofeed::models::ProviderId;
use macrofeed::monitor::ApiUsageMonitor;
use macrofeed::orchestrator::FetchOrchestrator;
use macrofeed::providers::build_registry;
use macrofeed::retry::RetryPolicy;
use macrofeed::service::MarketDataService;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load environment variables from .env if present
    dotenv().ok();
    logging::init_logging();

    let config = Config::from_env();
    info!("Starting Macrofeed Server");
    info!(environment = %config.environment, "Environment");

    let metrics = Arc::new(Metrics::new()?);
    let monitor = Arc::new(ApiUsageMonitor::new(&config.data_dir));
    let distributor = Arc::new(DataDistributor::new(&config.data_dir)?);

    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;

    let limiter = Arc::new(RateLimiter::new(HashMap::from([
        (
            ProviderId::Yahoo,
            RateLimit {
                calls_per_minute: config.rate_limits.yahoo,
                burst_limit: config.rate_limits.burst_limit,
            },
        ),
        (
            ProviderId::Fred,
            RateLimit {
                calls_per_minute: config.rate_limits.fred,
                burst_limit: config.rate_limits.burst_limit,
            },
        ),
        (
            ProviderId::Scrape,
            RateLimit {
                calls_per_minute: config.rate_limits.scrape,
                burst_limit: config.rate_limits.burst_limit,
            },
        ),
    ])));

    let registry = build_registry(&config, client);
    let orchestrator = FetchOrchestrator::new(
        registry,
        limiter,
        RetryPolicy::new(config.max_retries, config.retry_delay),
        monitor.clone(),
        metrics.clone(),
        config.max_concurrent_fetches,
        config.fetch_timeout,
    );

    let service = Arc::new(MarketDataService::new(
        orchestrator,
        distributor,
        config.symbols.clone(),
    ));
    let hub = Arc::new(PushHub::new());

    if config.refresh_interval_seconds > 0 {
        let scheduler = RefreshScheduler::new(
            service.clone(),
            hub.clone(),
            metrics.clone(),
            config.refresh_interval_seconds,
        )?;
        scheduler.start().await;
    } else {
        warn!("REFRESH_INTERVAL_SECONDS is 0, background refresh and push disabled");
    }

    let state = AppState {
        health: Arc::new(RwLock::new(HealthStatus::default())),
        metrics,
        start_time: Arc::new(Instant::now()),
        service,
        monitor,
        hub,
    };

    start_server(state, config.port).await
}
