//! Unit tests for multi-provider resolution

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use macrofeed::error::FetchError;
use macrofeed::limiter::RateLimiter;
use macrofeed::metrics::Metrics;
use macrofeed::models::{ProviderId, Quote};
use macrofeed::monitor::ApiUsageMonitor;
use macrofeed::orchestrator::FetchOrchestrator;
use macrofeed::providers::ProviderAdapter;
use macrofeed::retry::RetryPolicy;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::Duration;

fn temp_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "macrofeed-test-{tag}-{}-{nanos}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Adapter returning a canned outcome, optionally after a delay.
struct StubAdapter {
    provider: ProviderId,
    outcome: Result<Quote, FetchError>,
    delay: Duration,
}

impl StubAdapter {
    fn ok(provider: ProviderId, quote: Quote) -> Arc<dyn ProviderAdapter> {
        Arc::new(Self {
            provider,
            outcome: Ok(quote),
            delay: Duration::ZERO,
        })
    }

    fn err(provider: ProviderId, error: FetchError) -> Arc<dyn ProviderAdapter> {
        Arc::new(Self {
            provider,
            outcome: Err(error),
            delay: Duration::ZERO,
        })
    }

    fn slow(provider: ProviderId, quote: Quote, delay: Duration) -> Arc<dyn ProviderAdapter> {
        Arc::new(Self {
            provider,
            outcome: Ok(quote),
            delay,
        })
    }
}

#[async_trait]
impl ProviderAdapter for StubAdapter {
    fn id(&self) -> ProviderId {
        self.provider
    }

    fn supports(&self, _symbol: &str) -> bool {
        true
    }

    async fn fetch(&self, _symbol: &str) -> Result<Quote, FetchError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone()
    }
}

fn quote_at(provider: ProviderId, current: f64, epoch_secs: i64) -> Quote {
    Quote {
        symbol: "SPY".to_string(),
        current,
        previous: current,
        timestamp: Utc.timestamp_opt(epoch_secs, 0).unwrap(),
        source_id: provider,
    }
}

fn orchestrator(
    registry: Vec<Arc<dyn ProviderAdapter>>,
    data_dir: &PathBuf,
    fetch_timeout: Duration,
) -> FetchOrchestrator {
    FetchOrchestrator::new(
        registry,
        Arc::new(RateLimiter::new(HashMap::new())),
        RetryPolicy::new(1, Duration::from_millis(10)),
        Arc::new(ApiUsageMonitor::new(data_dir)),
        Arc::new(Metrics::new().unwrap()),
        4,
        fetch_timeout,
    )
}

#[tokio::test(start_paused = true)]
async fn freshest_timestamp_wins() {
    let dir = temp_dir("orch-freshest");
    let registry = vec![
        StubAdapter::ok(ProviderId::Yahoo, quote_at(ProviderId::Yahoo, 450.0, 1_000)),
        StubAdapter::ok(ProviderId::Fred, quote_at(ProviderId::Fred, 451.0, 2_000)),
    ];
    let orch = orchestrator(registry, &dir, Duration::from_secs(30));

    let quote = orch.resolve("SPY").await.unwrap();
    assert_eq!(quote.source_id, ProviderId::Fred);
    assert_eq!(quote.current, 451.0);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test(start_paused = true)]
async fn timestamp_tie_breaks_on_registry_order() {
    let dir = temp_dir("orch-tie");
    let registry = vec![
        StubAdapter::ok(ProviderId::Yahoo, quote_at(ProviderId::Yahoo, 450.0, 1_000)),
        StubAdapter::ok(ProviderId::Fred, quote_at(ProviderId::Fred, 451.0, 1_000)),
    ];
    let orch = orchestrator(registry, &dir, Duration::from_secs(30));

    let quote = orch.resolve("SPY").await.unwrap();
    assert_eq!(quote.source_id, ProviderId::Yahoo);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test(start_paused = true)]
async fn partial_failure_still_resolves() {
    let dir = temp_dir("orch-partial");
    let registry = vec![
        StubAdapter::err(
            ProviderId::Yahoo,
            FetchError::UpstreamUnavailable("down".into()),
        ),
        StubAdapter::ok(ProviderId::Fred, quote_at(ProviderId::Fred, 4.25, 1_000)),
    ];
    let orch = orchestrator(registry, &dir, Duration::from_secs(30));

    let quote = orch.resolve("SPY").await.unwrap();
    assert_eq!(quote.source_id, ProviderId::Fred);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test(start_paused = true)]
async fn total_failure_carries_every_reason() {
    let dir = temp_dir("orch-total");
    let registry = vec![
        StubAdapter::err(
            ProviderId::Yahoo,
            FetchError::UpstreamUnavailable("down".into()),
        ),
        StubAdapter::err(ProviderId::Fred, FetchError::Parse("garbage".into())),
    ];
    let orch = orchestrator(registry, &dir, Duration::from_secs(30));

    let err = orch.resolve("SPY").await.unwrap_err();
    assert_eq!(err.symbol, "SPY");
    assert_eq!(err.reasons.len(), 2);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test(start_paused = true)]
async fn deadline_abandons_slow_providers() {
    let dir = temp_dir("orch-deadline");
    let registry = vec![
        StubAdapter::ok(ProviderId::Yahoo, quote_at(ProviderId::Yahoo, 450.0, 1_000)),
        StubAdapter::slow(
            ProviderId::Scrape,
            quote_at(ProviderId::Scrape, 999.0, 9_000),
            Duration::from_secs(120),
        ),
    ];
    let orch = orchestrator(registry, &dir, Duration::from_secs(10));

    // The fast provider's quote is served; the slow one is abandoned at
    // the deadline even though its timestamp would have won.
    let quote = orch.resolve("SPY").await.unwrap();
    assert_eq!(quote.source_id, ProviderId::Yahoo);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test(start_paused = true)]
async fn deadline_with_no_successes_reports_abandonment() {
    let dir = temp_dir("orch-abandoned");
    let registry = vec![StubAdapter::slow(
        ProviderId::Yahoo,
        quote_at(ProviderId::Yahoo, 450.0, 1_000),
        Duration::from_secs(120),
    )];
    let orch = orchestrator(registry, &dir, Duration::from_secs(10));

    let err = orch.resolve("SPY").await.unwrap_err();
    assert_eq!(err.reasons.len(), 1);
    assert!(err.reasons[0].reason.contains("abandoned"));

    std::fs::remove_dir_all(&dir).ok();
}
