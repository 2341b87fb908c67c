//! Concurrent multi-provider fan-out with a hard deadline
//!
//! One `resolve` call races every supporting provider for a symbol,
//! each behind the rate limiter and retry policy, under a global
//! concurrency bound. Whatever has not reported by the fetch deadline
//! is abandoned and recorded as a failure reason.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::{timeout_at, Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::{FetchFailed, NoDataAvailable, ProviderFailure};
use crate::limiter::RateLimiter;
use crate::metrics::Metrics;
use crate::models::{ProviderId, Quote};
use crate::monitor::ApiUsageMonitor;
use crate::providers::ProviderAdapter;
use crate::retry::RetryPolicy;

pub struct FetchOrchestrator {
    registry: Vec<Arc<dyn ProviderAdapter>>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    monitor: Arc<ApiUsageMonitor>,
    metrics: Arc<Metrics>,
    /// Bounds in-flight provider calls across all concurrent resolves.
    permits: Arc<Semaphore>,
    fetch_timeout: Duration,
}

type TaskReport = (usize, ProviderId, Result<Quote, FetchFailed>);

impl FetchOrchestrator {
    pub fn new(
        registry: Vec<Arc<dyn ProviderAdapter>>,
        limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
        monitor: Arc<ApiUsageMonitor>,
        metrics: Arc<Metrics>,
        max_concurrent_fetches: usize,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            limiter,
            retry,
            monitor,
            metrics,
            permits: Arc::new(Semaphore::new(max_concurrent_fetches.clamp(3, 6))),
            fetch_timeout,
        }
    }

    /// Races all supporting providers and returns the canonical quote:
    /// the freshest timestamp, ties broken by registry order.
    pub async fn resolve(&self, symbol: &str) -> Result<Quote, NoDataAvailable> {
        let candidates: Vec<(usize, Arc<dyn ProviderAdapter>)> = self
            .registry
            .iter()
            .enumerate()
            .filter(|(_, adapter)| adapter.supports(symbol))
            .map(|(idx, adapter)| (idx, Arc::clone(adapter)))
            .collect();

        if candidates.is_empty() {
            warn!(symbol, "no provider supports symbol");
            return Err(NoDataAvailable {
                symbol: symbol.to_string(),
                reasons: Vec::new(),
            });
        }

        let deadline = Instant::now() + self.fetch_timeout;
        let (tx, mut rx) = mpsc::channel::<TaskReport>(candidates.len());

        for (idx, adapter) in &candidates {
            let idx = *idx;
            let adapter = Arc::clone(adapter);
            let limiter = Arc::clone(&self.limiter);
            let monitor = Arc::clone(&self.monitor);
            let metrics = Arc::clone(&self.metrics);
            let permits = Arc::clone(&self.permits);
            let retry = self.retry;
            let symbol = symbol.to_string();
            let tx = tx.clone();

            tokio::spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };
                let provider = adapter.id();
                let result = retry
                    .execute(|| {
                        let adapter = Arc::clone(&adapter);
                        let limiter = Arc::clone(&limiter);
                        let monitor = Arc::clone(&monitor);
                        let metrics = Arc::clone(&metrics);
                        let symbol = symbol.clone();
                        async move {
                            limiter.acquire(provider).await;
                            let outcome = adapter.fetch(&symbol).await;
                            metrics
                                .provider_fetches_total
                                .with_label_values(&[provider.as_str()])
                                .inc();
                            if outcome.is_err() {
                                metrics
                                    .provider_fetch_errors_total
                                    .with_label_values(&[provider.as_str()])
                                    .inc();
                            }
                            monitor.record(provider, outcome.is_ok()).await;
                            outcome
                        }
                    })
                    .await;
                // The receiver may be gone if the deadline already fired.
                let _ = tx.send((idx, provider, result)).await;
            });
        }
        drop(tx);

        let mut successes: Vec<(usize, Quote)> = Vec::new();
        let mut failures: Vec<ProviderFailure> = Vec::new();
        let mut reported: HashSet<usize> = HashSet::new();

        loop {
            match timeout_at(deadline, rx.recv()).await {
                Ok(Some((idx, _, Ok(quote)))) => {
                    reported.insert(idx);
                    successes.push((idx, quote));
                }
                Ok(Some((idx, provider, Err(err)))) => {
                    reported.insert(idx);
                    failures.push(ProviderFailure {
                        provider,
                        reason: err.to_string(),
                    });
                }
                Ok(None) => break,
                Err(_) => {
                    for (idx, adapter) in &candidates {
                        if !reported.contains(idx) {
                            failures.push(ProviderFailure {
                                provider: adapter.id(),
                                reason: "abandoned after fetch budget elapsed".to_string(),
                            });
                        }
                    }
                    break;
                }
            }
        }

        if !failures.is_empty() {
            info!(
                symbol,
                failed = failures.len(),
                succeeded = successes.len(),
                "partial provider outcome"
            );
        }

        let chosen = successes.into_iter().max_by(|(a_idx, a), (b_idx, b)| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| b_idx.cmp(a_idx))
        });

        match chosen {
            Some((_, quote)) => {
                debug!(symbol, source = %quote.source_id, "resolved canonical quote");
                Ok(quote)
            }
            None => Err(NoDataAvailable {
                symbol: symbol.to_string(),
                reasons: failures,
            }),
        }
    }
}
