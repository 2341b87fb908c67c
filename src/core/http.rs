//! HTTP endpoint server using Axum

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Request, State,
    },
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, info, Level};

use crate::core::push::PushHub;
use crate::error::ServiceError;
use crate::metrics::Metrics;
use crate::monitor::ApiUsageMonitor;
use crate::service::{analytics, MarketDataService};

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub service: Arc<MarketDataService>,
    pub monitor: Arc<ApiUsageMonitor>,
    pub hub: Arc<PushHub>,
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let healthy = state.service.probe().await;
    {
        let mut health = state.health.write().await;
        health.status = if healthy { "healthy" } else { "degraded" }.to_string();
    }
    let health = state.health.read().await;
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": uptime_seconds,
        "service": "macrofeed"
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();
    state.metrics.http_requests_in_flight.dec();

    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

/// Full snapshot plus derived analytics.
async fn market_data(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.service.snapshot().await;
    let analytics = analytics::compute(&snapshot);
    Json(json!({
        "snapshot": snapshot,
        "analytics": analytics,
    }))
}

async fn get_quote(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match state.service.get_quote(&symbol).await {
        Ok(quote) => Ok(Json(json!(quote))),
        Err(ServiceError::UnknownSymbol(_)) => Err(StatusCode::NOT_FOUND),
        Err(ServiceError::NoData(err)) => {
            debug!(symbol = %symbol, error = %err, "quote unavailable");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
        Err(ServiceError::Distribution(err)) => {
            debug!(symbol = %symbol, error = %err, "quote rejected by validation");
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

async fn usage(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.monitor.stats().await))
}

async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    state.metrics.ws_connections_total.inc();
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Forwards hub broadcasts to one client until it disconnects. Clients
/// that lag past the channel capacity skip to the newest update.
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let mut updates = state.hub.subscribe();
    info!(subscribers = state.hub.subscriber_count(), "push subscriber connected");

    loop {
        tokio::select! {
            update = updates.recv() => {
                match update {
                    Ok(message) => {
                        if socket.send(Message::Text(message.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "push subscriber lagged, resuming at newest update");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Inbound payloads are ignored; the stream is one-way.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    info!("push subscriber disconnected");
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/market-data", get(market_data))
        .route("/api/quotes/{symbol}", get(get_quote))
        .route("/api/usage", get(usage))
        .route("/ws", get(ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(
    state: AppState,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port = port, "HTTP server listening on port {}", port);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
