//! Main application state and service coordination
//!
//! This module contains the production AppState that wires the match manager
//! to its host collaborators, runs the tick driver and background tasks, and
//! tears every match down on shutdown.

use crate::config::AppConfig;
use crate::game::manager::MatchManager;
use crate::game::provider::{MatchConfiguration, StaticMatchConfigProvider};
use crate::host::{HostServices, TracingHost};
use crate::metrics::{HealthServer, HealthServerConfig, MetricsCollector, MetricsService};
use anyhow::Result;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Match engine
    manager: Arc<MatchManager>,

    /// Metrics service for monitoring and health checks
    metrics_service: Arc<MetricsService>,

    /// Tick driver and cleanup task, stopped through `shutdown_tx`
    engine_tasks: Vec<JoinHandle<()>>,

    /// Other background task handles
    background_tasks: Vec<JoinHandle<()>>,

    /// Shutdown signal for the engine tasks
    shutdown_tx: broadcast::Sender<()>,

    /// Service status
    is_running: Arc<RwLock<bool>>,
}

impl AppState {
    /// Initialize the application with a log-only host
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        let host = HostServices::from_host(Arc::new(TracingHost::new()));
        Self::with_host(config, host).await
    }

    /// Initialize the application against the given host collaborators
    pub async fn with_host(config: AppConfig, host: HostServices) -> Result<Self, ServiceError> {
        info!("Initializing {} match engine", config.service.name);
        info!(
            "Configuration: {} ticks/s, {} players per match, countdowns {}s/{}s",
            config.engine.ticks_per_second,
            config.engine.max_players,
            config.engine.lobby_countdown_seconds,
            config.engine.walls_countdown_seconds
        );

        let metrics_collector =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        let provider = StaticMatchConfigProvider::with_config(MatchConfiguration::from_settings(
            &config.engine,
        ))
        .map_err(|e| ServiceError::Configuration {
            message: e.to_string(),
        })?;

        let manager = Arc::new(MatchManager::with_metrics(
            Arc::new(provider),
            host,
            metrics_collector.clone(),
        ));

        let health_config = HealthServerConfig {
            port: config.service.metrics_port,
            host: "0.0.0.0".to_string(),
            service_name: config.service.name.clone(),
        };
        let health_server = Arc::new(
            HealthServer::new(health_config, metrics_collector.clone())
                .with_manager(manager.clone()),
        );
        let metrics_service = Arc::new(MetricsService::new(metrics_collector, health_server));

        let (shutdown_tx, _) = broadcast::channel(4);

        Ok(Self {
            config,
            manager,
            metrics_service,
            engine_tasks: Vec::new(),
            background_tasks: Vec::new(),
            shutdown_tx,
            is_running: Arc::new(RwLock::new(false)),
        })
    }

    /// Start all background services and the match engine
    pub async fn start(&mut self) -> Result<(), ServiceError> {
        info!("Starting {} service", self.config.service.name);

        self.start_metrics_service().await?;
        self.start_engine().await?;
        self.start_background_tasks();

        info!("✅ {} service started successfully", self.config.service.name);
        Ok(())
    }

    /// Create the configured matches and start the tick driver and cleanup
    pub async fn start_engine(&mut self) -> Result<(), ServiceError> {
        *self.is_running.write().await = true;

        for initial in &self.config.engine.initial_matches {
            self.manager
                .create_match(&initial.name, &initial.space)
                .await
                .map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create match '{}': {}", initial.name, e),
                })?;
        }

        let tick_task = self
            .manager
            .clone()
            .start_tick_task(self.config.tick_period(), self.shutdown_tx.subscribe());
        let cleanup_task = self
            .manager
            .clone()
            .start_cleanup_task(self.config.cleanup_interval(), self.shutdown_tx.subscribe());

        self.engine_tasks.push(tick_task);
        self.engine_tasks.push(cleanup_task);

        info!(
            "Match engine running with {} initial matches",
            self.config.engine.initial_matches.len()
        );
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&mut self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of {}", self.config.service.name);

        *self.is_running.write().await = false;

        // Stop ticking before tearing matches down
        if let Err(e) = self.shutdown_tx.send(()) {
            debug!("No engine task was listening for shutdown: {}", e);
        }
        let timeout = self.config.shutdown_timeout();
        for task in self.engine_tasks.drain(..) {
            if tokio::time::timeout(timeout, task).await.is_err() {
                warn!("Engine task did not stop within {:?}", timeout);
            }
        }

        self.teardown_matches().await;
        self.stop_background_tasks().await;

        info!("Stopping metrics service...");
        if let Err(e) = self.metrics_service.stop().await {
            warn!("Failed to stop metrics service: {}", e);
        }

        let final_stats =
            self.manager
                .get_stats()
                .await
                .map_err(|e| ServiceError::BackgroundTask {
                    message: format!("Failed to get final stats: {}", e),
                })?;

        info!("Final service statistics: {:?}", final_stats);
        info!("✅ {} shutdown completed", self.config.service.name);
        Ok(())
    }

    /// Return every player to the lobby
    async fn teardown_matches(&self) {
        let games = match self.manager.games_info().await {
            Ok(games) => games,
            Err(e) => {
                error!("Failed to list matches for teardown: {}", e);
                return;
            }
        };

        for game in games {
            match self.manager.remove_game(&game.name).await {
                Ok(players) => info!(
                    "Tore down match '{}' ({} players)",
                    game.name,
                    players.len()
                ),
                Err(e) => warn!("Failed to tear down match '{}': {}", game.name, e),
            }
        }
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Get the match manager
    pub fn manager(&self) -> Arc<MatchManager> {
        self.manager.clone()
    }

    /// Get metrics service
    pub fn metrics_service(&self) -> Arc<MetricsService> {
        self.metrics_service.clone()
    }

    /// Start metrics service
    async fn start_metrics_service(&mut self) -> Result<(), ServiceError> {
        info!("Starting metrics and health endpoints");

        let metrics_service = self.metrics_service.clone();
        let port = self.config.service.metrics_port;

        let metrics_handle = tokio::spawn(async move {
            if let Err(e) = metrics_service.start().await {
                error!("Metrics service failed: {}", e);
            } else {
                info!("Metrics service task completed");
            }
        });

        self.background_tasks.push(metrics_handle);

        // Give the server a moment to start up
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        info!("✅ Metrics service started on port {}", port);
        Ok(())
    }

    /// Start background maintenance tasks
    fn start_background_tasks(&mut self) {
        info!("Starting background maintenance tasks...");

        let metrics_task = {
            let manager = self.manager.clone();
            let metrics_collector = self.metrics_service.collector();
            let is_running = self.is_running.clone();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(15));
                let start_time = tokio::time::Instant::now();

                while *is_running.read().await {
                    interval.tick().await;

                    metrics_collector
                        .service()
                        .uptime_seconds
                        .set(start_time.elapsed().as_secs() as i64);

                    match manager.get_stats().await {
                        Ok(stats) => {
                            debug!(
                                "Updating metrics - matches: {}, players: {}, ticks: {}",
                                stats.active_matches, stats.players_in_matches, stats.ticks
                            );
                            metrics_collector.update_component_health("match_manager", true);
                        }
                        Err(e) => {
                            warn!("Failed to get manager stats for metrics update: {}", e);
                            metrics_collector.update_component_health("match_manager", false);
                        }
                    }
                }

                info!("Metrics update task stopped");
            })
        };

        self.background_tasks.push(metrics_task);
        info!("Background maintenance tasks started");
    }

    /// Stop all background tasks
    async fn stop_background_tasks(&mut self) {
        let task_count = self.background_tasks.len();
        if task_count == 0 {
            return;
        }

        info!("Stopping {} background tasks...", task_count);
        for task in self.background_tasks.drain(..) {
            task.abort();
        }
        info!("✅ All {} background tasks stopped", task_count);
    }
}
