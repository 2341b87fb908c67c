//! Market data service: the seam between the HTTP/push surface and the
//! fetch pipeline.
//!
//! Reads go cache-first. On a miss, exactly one caller per symbol runs
//! the orchestrator; concurrent callers for the same symbol are served
//! the last known good value instead of piling onto the upstreams.

pub mod analytics;

use chrono::{TimeZone, Utc};
use futures_util::future::join_all;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::distributor::DataDistributor;
use crate::error::ServiceError;
use crate::models::{DataKind, MarketSnapshot, ProviderId, Quote};
use crate::orchestrator::FetchOrchestrator;
use crate::providers::catalog;

pub struct MarketDataService {
    orchestrator: FetchOrchestrator,
    distributor: Arc<DataDistributor>,
    /// Last accepted quote per symbol, served when a concurrent fetch
    /// is already underway.
    last_good: Mutex<HashMap<String, Quote>>,
    /// Symbols currently being resolved.
    in_flight: Mutex<HashSet<String>>,
    symbols: Vec<String>,
}

impl MarketDataService {
    pub fn new(
        orchestrator: FetchOrchestrator,
        distributor: Arc<DataDistributor>,
        symbols: Vec<String>,
    ) -> Self {
        Self {
            orchestrator,
            distributor,
            last_good: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
            symbols,
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Cache-first quote lookup; resolves upstream on a miss.
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote, ServiceError> {
        if catalog::lookup(symbol).is_none() {
            return Err(ServiceError::UnknownSymbol(symbol.to_string()));
        }

        if let Some(published) = self.distributor.read(DataKind::MarketData, symbol) {
            if let Some(quote) = record_to_quote(&published.record) {
                return Ok(quote);
            }
        }

        let leader = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            in_flight.insert(symbol.to_string())
        };
        if !leader {
            // Another task is already resolving this symbol; serve the
            // last accepted value rather than blocking or duplicating.
            if let Some(prior) = self.last_good(symbol) {
                debug!(symbol, "serving last known good quote while fetch is in flight");
                return Ok(prior);
            }
            return Err(ServiceError::NoData(crate::error::NoDataAvailable {
                symbol: symbol.to_string(),
                reasons: Vec::new(),
            }));
        }

        self.distributor.mark_fetching(DataKind::MarketData, symbol);
        let result = self.resolve_and_publish(symbol).await;
        {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            in_flight.remove(symbol);
        }
        result
    }

    async fn resolve_and_publish(&self, symbol: &str) -> Result<Quote, ServiceError> {
        let quote = self.orchestrator.resolve(symbol).await?;

        // Never let a provider serving yesterday's close roll an already
        // accepted quote backwards.
        if let Some(prior) = self.last_good(symbol) {
            if quote.timestamp < prior.timestamp {
                debug!(symbol, source = %quote.source_id, "provider quote older than accepted one, keeping prior");
                return Ok(prior);
            }
        }

        let record = quote_to_record(&quote);
        match self
            .distributor
            .publish(DataKind::MarketData, symbol, record)
            .await
        {
            Ok(_) => {
                let mut last_good = self.last_good.lock().unwrap_or_else(|e| e.into_inner());
                last_good.insert(symbol.to_string(), quote.clone());
                Ok(quote)
            }
            Err(err) => {
                if let Some(prior) = self.last_good(symbol) {
                    warn!(symbol, error = %err, "rejected quote, serving prior value");
                    Ok(prior)
                } else {
                    Err(err.into())
                }
            }
        }
    }

    /// Resolves the whole catalogue, collecting per-symbol failures
    /// instead of failing the snapshot.
    pub async fn snapshot(&self) -> MarketSnapshot {
        let lookups = self.symbols.iter().map(|symbol| async move {
            (symbol.clone(), self.get_quote(symbol).await)
        });

        let mut snapshot = MarketSnapshot::new();
        for (symbol, outcome) in join_all(lookups).await {
            match outcome {
                Ok(quote) => {
                    snapshot.quotes.insert(symbol, (&quote).into());
                }
                Err(err) => {
                    snapshot.failures.insert(symbol, err.to_string());
                }
            }
        }
        snapshot
    }

    /// Liveness probe: healthy when at least one instrument resolves or
    /// is already cached.
    pub async fn probe(&self) -> bool {
        match self.symbols.first() {
            Some(symbol) => self.get_quote(symbol).await.is_ok(),
            None => false,
        }
    }

    fn last_good(&self, symbol: &str) -> Option<Quote> {
        self.last_good
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(symbol)
            .cloned()
    }
}

/// Shape handed to the validator and cached for a quote.
fn quote_to_record(quote: &Quote) -> Value {
    json!({
        "symbol": quote.symbol,
        "price": quote.current,
        "previous": quote.previous,
        "change": quote.change_percent(),
        "timestamp": quote.timestamp.timestamp_millis() as f64 / 1000.0,
        "source": quote.source_id,
    })
}

fn record_to_quote(record: &Value) -> Option<Quote> {
    let symbol = record.get("symbol")?.as_str()?;
    let current = record.get("price")?.as_f64()?;
    let previous = record.get("previous")?.as_f64()?;
    let epoch = record.get("timestamp")?.as_f64()?;
    let timestamp = Utc.timestamp_millis_opt((epoch * 1000.0) as i64).single()?;
    let source_id: ProviderId = serde_json::from_value(record.get("source")?.clone()).ok()?;
    Some(Quote {
        symbol: symbol.to_string(),
        current,
        previous,
        timestamp,
        source_id,
    })
}
