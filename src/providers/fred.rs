//! FRED (Federal Reserve Economic Data) adapter
//!
//! Reads the two most recent observations of a series. FRED encodes
//! missing observations as the literal string ".", which are skipped.

use async_trait::async_trait;
use serde::Deserialize;

use super::{catalog, ProviderAdapter};
use crate::error::FetchError;
use crate::models::{ProviderId, Quote};

const DEFAULT_BASE_URL: &str = "https://api.stlouisfed.org";

pub struct FredAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    value: String,
}

impl FredAdapter {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        client: reqwest::Client,
        api_key: String,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    fn series_for(symbol: &str) -> Option<&'static str> {
        catalog::lookup(symbol).and_then(|i| i.fred)
    }
}

#[async_trait]
impl ProviderAdapter for FredAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Fred
    }

    fn supports(&self, symbol: &str) -> bool {
        Self::series_for(symbol).is_some()
    }

    async fn fetch(&self, symbol: &str) -> Result<Quote, FetchError> {
        let series = Self::series_for(symbol)
            .ok_or_else(|| FetchError::Parse(format!("no fred series for {symbol}")))?;

        // Ask for a few extra observations so "." placeholders on recent
        // days still leave two usable values.
        let url = format!(
            "{}/fred/series/observations?series_id={}&api_key={}&file_type=json&sort_order=desc&limit=5",
            self.base_url, series, self.api_key
        );
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::UpstreamUnavailable(format!(
                "fred returned {} for {series}",
                response.status()
            )));
        }

        let body: ObservationsResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(format!("fred observations for {series}: {e}")))?;

        // Observations arrive newest first.
        let values: Vec<f64> = body
            .observations
            .iter()
            .filter_map(|o| o.value.parse::<f64>().ok())
            .take(2)
            .collect();

        match values.as_slice() {
            [] => Err(FetchError::Parse(format!(
                "no numeric observations for {series}"
            ))),
            [current] => Ok(Quote::new(symbol, *current, *current, ProviderId::Fred)),
            [current, previous, ..] => {
                Ok(Quote::new(symbol, *current, *previous, ProviderId::Fred))
            }
        }
    }
}
