//! Environment-based configuration
//!
//! All knobs come from environment variables (loaded from `.env` by the
//! binaries via dotenvy) with conservative defaults. API keys are read
//! once at startup and handed to the adapters that need them.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Returns the deployment environment (`ENVIRONMENT`, default "development").
pub fn get_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Per-provider calls-per-minute budgets for the sliding-window limiter.
#[derive(Debug, Clone, Copy)]
pub struct RateLimits {
    pub yahoo: usize,
    pub fred: usize,
    pub scrape: usize,
    pub burst_limit: usize,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub port: u16,
    /// Directory holding the durable cache and usage-monitor files.
    pub data_dir: PathBuf,
    pub fred_api_key: Option<String>,
    pub rate_limits: RateLimits,
    /// TTL for market-data cache entries.
    pub cache_duration: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Per-request timeout applied to the shared HTTP client.
    pub request_timeout: Duration,
    /// Global budget for one orchestrator resolve call.
    pub fetch_timeout: Duration,
    pub max_concurrent_fetches: usize,
    /// Interval of the background refresh/push loop; 0 disables it.
    pub refresh_interval_seconds: u64,
    /// Optional proxy pool for the scraping adapter, comma separated.
    pub scrape_proxies: Vec<String>,
    /// Instrument keys the background loop keeps fresh.
    pub symbols: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let scrape_proxies = env::var("SCRAPE_PROXIES")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        // Duration::from_secs_f64 panics on negative or non-finite input.
        let retry_delay = env_parse("RETRY_DELAY", 2.0_f64);
        let retry_delay = if retry_delay.is_finite() && retry_delay >= 0.0 {
            retry_delay
        } else {
            2.0
        };

        let symbols = env::var("SYMBOLS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(crate::providers::catalog::default_symbols);

        Self {
            environment: get_environment(),
            port: env_parse("PORT", 8080),
            data_dir: PathBuf::from(
                env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            ),
            fred_api_key: env::var("FRED_API_KEY").ok().filter(|k| !k.is_empty()),
            rate_limits: RateLimits {
                yahoo: env_parse("YAHOO_RATE_LIMIT", 30),
                fred: env_parse("FRED_RATE_LIMIT", 60),
                scrape: env_parse("SCRAPE_RATE_LIMIT", 10),
                burst_limit: env_parse("BURST_LIMIT", 5),
            },
            cache_duration: Duration::from_secs(env_parse("CACHE_DURATION", 300)),
            max_retries: env_parse("MAX_RETRIES", 3),
            retry_delay: Duration::from_secs_f64(retry_delay),
            request_timeout: Duration::from_secs(env_parse("TIMEOUT", 10)),
            fetch_timeout: Duration::from_secs(env_parse("FETCH_TIMEOUT", 45)),
            max_concurrent_fetches: env_parse("MAX_CONCURRENT_FETCHES", 4).clamp(3, 6),
            refresh_interval_seconds: env_parse("REFRESH_INTERVAL_SECONDS", 5),
            scrape_proxies,
            symbols,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
