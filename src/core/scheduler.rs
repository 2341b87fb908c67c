//! Cron-based background refresh loop
//!
//! Resolves the whole catalogue on every tick and pushes the resulting
//! snapshot (with derived analytics) to WebSocket subscribers. Symbols
//! still fresh in the cache are served from it, so a tick only hits the
//! upstreams for instruments whose refresh interval has elapsed.

use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::core::push::{PushHub, MARKET_UPDATE_CHANNEL};
use crate::metrics::Metrics;
use crate::service::{analytics, MarketDataService};

pub struct RefreshScheduler {
    service: Arc<MarketDataService>,
    hub: Arc<PushHub>,
    metrics: Arc<Metrics>,
    schedule: Schedule,
    handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl RefreshScheduler {
    /// `interval_seconds` of 0 disables the loop and is an error here;
    /// callers skip construction in that case.
    pub fn new(
        service: Arc<MarketDataService>,
        hub: Arc<PushHub>,
        metrics: Arc<Metrics>,
        interval_seconds: u64,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        if interval_seconds == 0 {
            return Err("refresh loop disabled: interval_seconds is 0".into());
        }

        // Cron format: second minute hour day month weekday
        let cron_expr = if interval_seconds >= 60 {
            format!("0 */{} * * * *", interval_seconds / 60)
        } else {
            format!("*/{} * * * * *", interval_seconds)
        };
        let schedule = Schedule::from_str(&cron_expr)?;

        info!(
            interval = interval_seconds,
            cron = %cron_expr,
            "refresh scheduler created"
        );

        Ok(Self {
            service,
            hub,
            metrics,
            schedule,
            handle: Arc::new(RwLock::new(None)),
        })
    }

    pub async fn start(&self) {
        let service = self.service.clone();
        let hub = self.hub.clone();
        let metrics = self.metrics.clone();
        let schedule = self.schedule.clone();
        let handle_arc = self.handle.clone();

        let handle = tokio::spawn(async move {
            info!("refresh scheduler started, waiting for first tick");
            loop {
                let mut upcoming = schedule.upcoming(chrono::Utc);
                match upcoming.next() {
                    Some(next_tick) => {
                        let now = chrono::Utc::now();
                        if next_tick > now {
                            let wait = (next_tick - now).to_std().unwrap_or_default();
                            tokio::time::sleep(wait).await;
                        }
                    }
                    None => {
                        tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
                        continue;
                    }
                }

                let timer = metrics.fetch_duration_seconds.start_timer();
                let snapshot = service.snapshot().await;
                timer.observe_duration();

                if snapshot.is_empty() {
                    warn!("refresh tick produced an empty snapshot, skipping push");
                    continue;
                }

                let analytics = analytics::compute(&snapshot);
                let payload = serde_json::json!({
                    "snapshot": snapshot,
                    "analytics": analytics,
                });
                let receivers = hub.publish(MARKET_UPDATE_CHANNEL, &payload);
                metrics.push_messages_total.inc();
                debug!(
                    quotes = snapshot.quotes.len(),
                    failures = snapshot.failures.len(),
                    receivers,
                    "pushed market update"
                );
            }
        });

        let mut h = handle_arc.write().await;
        *h = Some(handle);
    }

    pub async fn stop(&self) {
        let mut handle = self.handle.write().await;
        if let Some(h) = handle.take() {
            h.abort();
            info!("refresh scheduler stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.handle.read().await.is_some()
    }
}
