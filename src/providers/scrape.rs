//! Last-resort HTML scraping adapter
//!
//! Fetches a quote page and pulls the current/previous values out of
//! data attributes. Rotates user agents on every request and, when a
//! proxy pool is configured, round-robins requests across per-proxy
//! clients so no single exit address carries all the traffic.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::warn;

use super::catalog::{self, ScrapeTarget};
use super::ProviderAdapter;
use crate::error::FetchError;
use crate::models::{ProviderId, Quote};

const DEFAULT_BASE_URL: &str = "https://www.investing.com";

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:126.0) Gecko/20100101 Firefox/126.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:126.0) Gecko/20100101 Firefox/126.0",
];

pub struct ScrapeAdapter {
    /// Direct client plus one client per configured proxy.
    clients: Vec<reqwest::Client>,
    next_client: AtomicUsize,
    next_agent: AtomicUsize,
    base_url: String,
}

impl ScrapeAdapter {
    pub fn new(direct: reqwest::Client, proxies: &[String], timeout: Duration) -> Self {
        Self::with_base_url(direct, proxies, timeout, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        direct: reqwest::Client,
        proxies: &[String],
        timeout: Duration,
        base_url: impl Into<String>,
    ) -> Self {
        let mut clients = vec![direct];
        for proxy_url in proxies {
            match build_proxy_client(proxy_url, timeout) {
                Ok(client) => clients.push(client),
                Err(err) => warn!(proxy = %proxy_url, error = %err, "skipping unusable scrape proxy"),
            }
        }

        Self {
            clients,
            next_client: AtomicUsize::new(0),
            next_agent: AtomicUsize::new(0),
            base_url: base_url.into(),
        }
    }

    fn target_for(symbol: &str) -> Option<ScrapeTarget> {
        catalog::lookup(symbol).and_then(|i| i.scrape)
    }

    fn client(&self) -> &reqwest::Client {
        let idx = self.next_client.fetch_add(1, Ordering::Relaxed) % self.clients.len();
        &self.clients[idx]
    }

    fn user_agent(&self) -> &'static str {
        let idx = self.next_agent.fetch_add(1, Ordering::Relaxed) % USER_AGENTS.len();
        USER_AGENTS[idx]
    }
}

fn build_proxy_client(proxy_url: &str, timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .proxy(reqwest::Proxy::all(proxy_url)?)
        .timeout(timeout)
        .build()
}

#[async_trait]
impl ProviderAdapter for ScrapeAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Scrape
    }

    fn supports(&self, symbol: &str) -> bool {
        Self::target_for(symbol).is_some()
    }

    async fn fetch(&self, symbol: &str) -> Result<Quote, FetchError> {
        let target = Self::target_for(symbol)
            .ok_or_else(|| FetchError::Parse(format!("no scrape target for {symbol}")))?;

        let url = format!("{}{}", self.base_url, target.path);
        let response = self
            .client()
            .get(&url)
            .header(reqwest::header::USER_AGENT, self.user_agent())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(FetchError::UpstreamUnavailable(format!(
                "scrape host returned {} for {}",
                response.status(),
                target.path
            )));
        }

        let html = response.text().await?;
        let current = extract_number_after(&html, target.current_marker).ok_or_else(|| {
            FetchError::Parse(format!("current value marker missing on {}", target.path))
        })?;
        let previous = extract_number_after(&html, target.previous_marker).unwrap_or(current);

        Ok(Quote::new(symbol, current, previous, ProviderId::Scrape))
    }
}

/// Parses the number immediately following `marker`, tolerating thousands
/// separators. Returns None if the marker is absent or the value does not
/// parse.
fn extract_number_after(html: &str, marker: &str) -> Option<f64> {
    let start = html.find(marker)? + marker.len();
    let rest = &html[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit() && c != '.' && c != ',' && c != '-')
        .unwrap_or(rest.len());
    rest[..end].replace(',', "").parse().ok()
}
