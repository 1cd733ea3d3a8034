//! Health check endpoints and Prometheus metrics server
//!
//! This module provides HTTP endpoints for health checks, Prometheus metrics
//! and match inspection for the wallwars service using Axum.

use crate::game::manager::MatchManager;
use crate::metrics::collector::MetricsCollector;
use crate::service::health::{HealthCheck, HealthStatus};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Health server configuration
#[derive(Debug, Clone)]
pub struct HealthServerConfig {
    /// Port to bind the health server to
    pub port: u16,
    /// Host to bind to (typically "0.0.0.0" for all interfaces)
    pub host: String,
    /// Service name reported by the endpoints
    pub service_name: String,
}

impl Default for HealthServerConfig {
    fn default() -> Self {
        Self {
            port: 9464,
            host: "0.0.0.0".to_string(),
            service_name: "wallwars".to_string(),
        }
    }
}

/// Shared state for the health server
#[derive(Clone)]
pub struct HealthServerState {
    pub metrics_collector: Arc<MetricsCollector>,
    pub manager: Option<Arc<MatchManager>>,
    pub service_name: String,
}

/// Health server that provides HTTP endpoints for monitoring
pub struct HealthServer {
    config: HealthServerConfig,
    state: HealthServerState,
    shutdown_tx: broadcast::Sender<()>,
    _shutdown_rx: broadcast::Receiver<()>,
}

impl HealthServer {
    /// Create a new health server
    pub fn new(config: HealthServerConfig, metrics_collector: Arc<MetricsCollector>) -> Self {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let service_name = config.service_name.clone();

        Self {
            config,
            state: HealthServerState {
                metrics_collector,
                manager: None,
                service_name,
            },
            shutdown_tx,
            _shutdown_rx: shutdown_rx,
        }
    }

    /// Set the match manager backing health checks and inspection
    pub fn with_manager(mut self, manager: Arc<MatchManager>) -> Self {
        self.state.manager = Some(manager);
        self
    }

    /// Start the health server
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid health server address")?;

        let app = self.create_router();
        let listener = TcpListener::bind(addr).await?;

        info!("Health server listening on http://{}", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("Health server shutdown signal received");
            })
            .await?;

        info!("Health server stopped");
        Ok(())
    }

    /// Create the Axum router with all health endpoints
    fn create_router(&self) -> Router {
        Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .route("/ready", get(ready_handler))
            .route("/alive", get(alive_handler))
            .route("/metrics", get(metrics_handler))
            .route("/stats", get(stats_handler))
            .route("/matches", get(matches_handler))
            .with_state(self.state.clone())
    }

    /// Stop the health server
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping health server...");

        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to health server: {}", e);
        }

        Ok(())
    }
}

/// Root endpoint handler - shows service information
async fn root_handler(State(state): State<HealthServerState>) -> impl IntoResponse {
    Json(json!({
        "service": state.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/health",
            "/ready",
            "/alive",
            "/metrics",
            "/stats",
            "/matches"
        ]
    }))
}

fn not_initialized(service_name: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "status": "unhealthy",
            "service": service_name,
            "version": env!("CARGO_PKG_VERSION"),
            "error": "Service not initialized"
        })),
    )
}

/// Lightweight health check endpoint handler
async fn health_handler(State(state): State<HealthServerState>) -> impl IntoResponse {
    debug!("Health check requested");

    let Some(manager) = &state.manager else {
        return not_initialized(&state.service_name);
    };

    let status = HealthCheck::liveness_check(manager)
        .await
        .unwrap_or(HealthStatus::Unhealthy);
    state
        .metrics_collector
        .update_health_status(status.as_gauge());

    let code = match status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };
    (
        code,
        Json(json!({
            "status": status,
            "service": state.service_name,
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Readiness check endpoint handler
async fn ready_handler(State(state): State<HealthServerState>) -> impl IntoResponse {
    debug!("Readiness check requested");

    match &state.manager {
        Some(manager) => match HealthCheck::readiness_check(manager).await {
            Ok(HealthStatus::Healthy) => (StatusCode::OK, "Ready"),
            Ok(HealthStatus::Degraded) => (StatusCode::OK, "Degraded but ready"),
            Ok(HealthStatus::Unhealthy) => (StatusCode::SERVICE_UNAVAILABLE, "Not ready"),
            Err(e) => {
                error!("Readiness check failed: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "Not ready")
            }
        },
        None => (StatusCode::SERVICE_UNAVAILABLE, "Service not initialized"),
    }
}

/// Liveness check endpoint handler
async fn alive_handler(State(state): State<HealthServerState>) -> impl IntoResponse {
    debug!("Liveness check requested");

    match &state.manager {
        Some(manager) => match HealthCheck::liveness_check(manager).await {
            Ok(HealthStatus::Healthy) => (StatusCode::OK, "Alive"),
            _ => (StatusCode::SERVICE_UNAVAILABLE, "Not alive"),
        },
        None => (StatusCode::SERVICE_UNAVAILABLE, "Service not initialized"),
    }
}

/// Prometheus metrics endpoint handler
async fn metrics_handler(State(state): State<HealthServerState>) -> Response {
    debug!("Metrics endpoint requested");

    let metric_families = state.metrics_collector.registry().gather();
    let encoder = TextEncoder::new();

    match encoder.encode_to_string(&metric_families) {
        Ok(metrics_output) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, encoder.format_type().to_string())],
            metrics_output,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics".to_string(),
            )
                .into_response()
        }
    }
}

/// Detailed service statistics endpoint handler
async fn stats_handler(State(state): State<HealthServerState>) -> impl IntoResponse {
    debug!("Stats endpoint requested");

    let Some(manager) = &state.manager else {
        return not_initialized(&state.service_name);
    };

    match HealthCheck::check(manager, &state.service_name).await {
        Ok(health) => (
            StatusCode::OK,
            Json(json!({
                "service": {
                    "name": health.service,
                    "version": health.version,
                    "status": health.status
                },
                "matches": {
                    "active": health.stats.active_matches,
                    "created": health.stats.matches_created,
                    "removed": health.stats.matches_removed
                },
                "players": {
                    "in_matches": health.stats.players_in_matches
                },
                "ticks": health.stats.ticks,
                "dispatch_failures": health.stats.dispatch_failures,
                "components": health.checks,
                "timestamp": health.timestamp
            })),
        ),
        Err(e) => {
            error!("Failed to get stats: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "Failed to get service stats",
                    "timestamp": chrono::Utc::now()
                })),
            )
        }
    }
}

/// Snapshot of every live match, the HTTP form of "gamesinfo"
async fn matches_handler(State(state): State<HealthServerState>) -> impl IntoResponse {
    let Some(manager) = &state.manager else {
        return not_initialized(&state.service_name);
    };

    match manager.games_info().await {
        Ok(games) => (StatusCode::OK, Json(json!(games))),
        Err(e) => {
            error!("Failed to list matches: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::provider::StaticMatchConfigProvider;
    use crate::host::{HostServices, RecordingHost};
    use crate::types::{Location, Player, Point};
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use tower::ServiceExt; // for oneshot

    fn server_without_manager() -> HealthServer {
        let collector = Arc::new(MetricsCollector::new().expect("Failed to create collector"));
        HealthServer::new(HealthServerConfig::default(), collector)
    }

    async fn server_with_match() -> HealthServer {
        let collector = Arc::new(MetricsCollector::new().unwrap());
        let manager = MatchManager::with_metrics(
            Arc::new(StaticMatchConfigProvider::new()),
            HostServices::from_host(Arc::new(RecordingHost::new())),
            collector.clone(),
        );
        manager.create_match("arena", "minecraft:overworld").await.unwrap();
        manager
            .join_player(
                "arena",
                Player::new("steve", "Steve"),
                Location::new("minecraft:overworld", Point::default()),
            )
            .await
            .unwrap();

        HealthServer::new(HealthServerConfig::default(), collector).with_manager(Arc::new(manager))
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_root_endpoint() {
        let app = server_without_manager().create_router();
        let response = get(app, "/").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let server = server_with_match().await;
        let response = get(server.create_router(), "/metrics").await;

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers().get("content-type").unwrap();
        assert!(content_type.to_str().unwrap().contains("text/plain"));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("wallwars_players_joined_total 1"));
    }

    #[tokio::test]
    async fn test_endpoints_without_manager() {
        let app = server_without_manager().create_router();

        for uri in ["/health", "/ready", "/alive", "/stats", "/matches"] {
            let response = get(app.clone(), uri).await;
            assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_endpoints_with_manager() {
        let app = server_with_match().await.create_router();

        for uri in ["/health", "/ready", "/alive", "/stats"] {
            let response = get(app.clone(), uri).await;
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_matches_endpoint() {
        let app = server_with_match().await.create_router();
        let response = get(app, "/matches").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let games: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(games[0]["name"], "arena");
        assert_eq!(games[0]["player_count"], 1);
        assert_eq!(games[0]["phase"], "Lobby");
    }

    #[tokio::test]
    async fn test_404_handling() {
        let app = server_without_manager().create_router();
        let response = get(app, "/nonexistent").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_health_server_config() {
        let config = HealthServerConfig::default();
        assert_eq!(config.port, 9464);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.service_name, "wallwars");
    }
}
