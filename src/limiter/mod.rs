//! Per-provider sliding-window rate limiting with a burst guard
//!
//! `acquire` only ever delays the caller; it never rejects. The window
//! state is self-pruning: stale call timestamps are dropped lazily on
//! each acquire.

use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

use crate::models::ProviderId;

/// Length of both the long window and the burst sub-window.
const WINDOW: Duration = Duration::from_secs(60);

/// Admission budget for one provider.
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    pub calls_per_minute: usize,
    pub burst_limit: usize,
}

#[derive(Debug)]
struct RateWindow {
    call_timestamps: VecDeque<Instant>,
    burst_count: usize,
    burst_window_start: Instant,
}

impl RateWindow {
    fn new() -> Self {
        Self {
            call_timestamps: VecDeque::new(),
            burst_count: 0,
            burst_window_start: Instant::now(),
        }
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.call_timestamps.front() {
            if now.duration_since(oldest) >= WINDOW {
                self.call_timestamps.pop_front();
            } else {
                break;
            }
        }
        if now.duration_since(self.burst_window_start) >= WINDOW {
            self.burst_count = 0;
            self.burst_window_start = now;
        }
    }

    /// Returns how long the caller must wait, or records the call and
    /// admits it immediately.
    fn try_admit(&mut self, limit: RateLimit, now: Instant) -> Option<Duration> {
        self.prune(now);

        // A zero budget would block forever; treat it as one call per window.
        let calls_per_minute = limit.calls_per_minute.max(1);
        let burst_limit = limit.burst_limit.max(1);

        if self.burst_count >= burst_limit {
            return Some(WINDOW - now.duration_since(self.burst_window_start));
        }
        if self.call_timestamps.len() >= calls_per_minute {
            // Admissible once the oldest call falls out of the window.
            if let Some(&oldest) = self.call_timestamps.front() {
                return Some(WINDOW - now.duration_since(oldest));
            }
        }

        self.call_timestamps.push_back(now);
        self.burst_count += 1;
        None
    }
}

/// Sliding-window limiter keyed by provider. One lock guards all windows;
/// the lock is never held across a sleep.
pub struct RateLimiter {
    limits: HashMap<ProviderId, RateLimit>,
    default_limit: RateLimit,
    windows: Mutex<HashMap<ProviderId, RateWindow>>,
}

impl RateLimiter {
    pub fn new(limits: HashMap<ProviderId, RateLimit>) -> Self {
        Self {
            limits,
            default_limit: RateLimit {
                calls_per_minute: 30,
                burst_limit: 5,
            },
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn limit_for(&self, provider: ProviderId) -> RateLimit {
        self.limits.get(&provider).copied().unwrap_or(self.default_limit)
    }

    /// Blocks (async sleeps) until a call to `provider` is admissible,
    /// then records it. Never returns an error.
    pub async fn acquire(&self, provider: ProviderId) {
        let limit = self.limit_for(provider);
        loop {
            let wait = {
                let mut windows = self.windows.lock().await;
                windows
                    .entry(provider)
                    .or_insert_with(RateWindow::new)
                    .try_admit(limit, Instant::now())
            };
            match wait {
                None => return,
                Some(delay) if delay.is_zero() => continue,
                Some(delay) => {
                    debug!(provider = %provider, wait_ms = delay.as_millis() as u64, "rate limit reached, waiting");
                    sleep(delay).await;
                }
            }
        }
    }
}
