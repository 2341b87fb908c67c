//! Prometheus metrics registry

use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_requests_in_flight: IntGauge,
    pub http_request_duration_seconds: Histogram,
    pub provider_fetches_total: IntCounterVec,
    pub provider_fetch_errors_total: IntCounterVec,
    pub fetch_duration_seconds: Histogram,
    pub push_messages_total: IntCounter,
    pub ws_connections_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounter::with_opts(Opts::new(
            "http_requests_total",
            "Total HTTP requests handled",
        ))?;
        let http_requests_in_flight = IntGauge::with_opts(Opts::new(
            "http_requests_in_flight",
            "HTTP requests currently being handled",
        ))?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency",
        ))?;
        let provider_fetches_total = IntCounterVec::new(
            Opts::new("provider_fetches_total", "Upstream fetches per provider"),
            &["provider"],
        )?;
        let provider_fetch_errors_total = IntCounterVec::new(
            Opts::new(
                "provider_fetch_errors_total",
                "Failed upstream fetches per provider",
            ),
            &["provider"],
        )?;
        let fetch_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "fetch_duration_seconds",
            "End-to-end symbol resolution latency",
        ))?;
        let push_messages_total = IntCounter::with_opts(Opts::new(
            "push_messages_total",
            "Market update messages pushed to subscribers",
        ))?;
        let ws_connections_total = IntCounter::with_opts(Opts::new(
            "ws_connections_total",
            "WebSocket connections accepted",
        ))?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(provider_fetches_total.clone()))?;
        registry.register(Box::new(provider_fetch_errors_total.clone()))?;
        registry.register(Box::new(fetch_duration_seconds.clone()))?;
        registry.register(Box::new(push_messages_total.clone()))?;
        registry.register(Box::new(ws_connections_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_requests_in_flight,
            http_request_duration_seconds,
            provider_fetches_total,
            provider_fetch_errors_total,
            fetch_duration_seconds,
            push_messages_total,
            ws_connections_total,
        })
    }

    /// Renders all registered metrics in the Prometheus text format.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        encoder.encode_to_string(&self.registry.gather())
    }
}
