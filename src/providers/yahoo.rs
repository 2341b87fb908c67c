//! Yahoo Finance chart API adapter
//!
//! Pulls two daily closes from the v8 chart endpoint and derives
//! current/previous from the last two non-null values.

use async_trait::async_trait;
use serde_json::Value;

use super::{catalog, ProviderAdapter};
use crate::error::FetchError;
use crate::models::{ProviderId, Quote};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

pub struct YahooAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl YahooAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn ticker_for(symbol: &str) -> Option<&'static str> {
        catalog::lookup(symbol).and_then(|i| i.yahoo)
    }
}

#[async_trait]
impl ProviderAdapter for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn supports(&self, symbol: &str) -> bool {
        Self::ticker_for(symbol).is_some()
    }

    async fn fetch(&self, symbol: &str) -> Result<Quote, FetchError> {
        let ticker = Self::ticker_for(symbol)
            .ok_or_else(|| FetchError::Parse(format!("no yahoo ticker for {symbol}")))?;

        let url = format!(
            "{}/v8/finance/chart/{}?range=2d&interval=1d",
            self.base_url, ticker
        );
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::UpstreamUnavailable(format!(
                "yahoo returned {} for {ticker}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        let (current, previous) = parse_chart_closes(&body)
            .ok_or_else(|| FetchError::Parse(format!("no usable closes for {ticker}")))?;

        Ok(Quote::new(symbol, current, previous, ProviderId::Yahoo))
    }
}

/// Extracts (current, previous) from a chart response. With a single
/// close available, previous equals current and the change reads as 0.
fn parse_chart_closes(body: &Value) -> Option<(f64, f64)> {
    let closes = body
        .pointer("/chart/result/0/indicators/quote/0/close")?
        .as_array()?;

    let values: Vec<f64> = closes.iter().filter_map(Value::as_f64).collect();
    match values.as_slice() {
        [] => None,
        [only] => Some((*only, *only)),
        [.., previous, current] => Some((*current, *previous)),
    }
}
