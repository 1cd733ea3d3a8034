//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the Wall Wars match engine
//! using Prometheus metrics.

use crate::error::MatchError;
use crate::game::manager::MatchManagerStats;
use crate::types::Phase;
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the match engine
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Match lifecycle metrics
    match_metrics: MatchMetrics,

    /// Player-related metrics
    player_metrics: PlayerMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Host commands that failed to dispatch
    pub dispatch_failures_total: IntCounter,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Match lifecycle metrics
#[derive(Clone)]
pub struct MatchMetrics {
    /// Number of live matches
    pub active_matches: IntGauge,

    /// Total matches created
    pub matches_created_total: IntCounter,

    /// Total matches torn down, by reason
    pub matches_removed_total: IntCounterVec,

    /// Phase transitions, labeled by the phase entered
    pub phase_transitions_total: IntCounterVec,
}

/// Player-related metrics
#[derive(Clone)]
pub struct PlayerMetrics {
    /// Total successful joins
    pub players_joined_total: IntCounter,

    /// Total successful leaves, including teardown
    pub players_left_total: IntCounter,

    /// Refused joins by reason
    pub joins_rejected_total: IntCounterVec,

    /// Players currently in a match
    pub players_in_matches: IntGauge,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Time spent ticking every live match once
    pub tick_duration: Histogram,

    /// Command-layer operation durations
    pub operation_duration: HistogramVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let match_metrics = MatchMetrics::new(&registry)?;
        let player_metrics = PlayerMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            match_metrics,
            player_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get match metrics
    pub fn matches(&self) -> &MatchMetrics {
        &self.match_metrics
    }

    /// Get player metrics
    pub fn player(&self) -> &PlayerMetrics {
        &self.player_metrics
    }

    /// Get performance metrics
    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Refresh the gauges from manager stats
    pub fn update_from_manager_stats(&self, stats: &MatchManagerStats) {
        self.match_metrics
            .active_matches
            .set(stats.active_matches as i64);
        self.player_metrics
            .players_in_matches
            .set(stats.players_in_matches as i64);
    }

    /// Record a match being created
    pub fn record_match_created(&self) {
        self.match_metrics.matches_created_total.inc();
        self.match_metrics.active_matches.inc();
    }

    /// Record a match being torn down
    pub fn record_match_removed(&self, reason: &str) {
        self.match_metrics
            .matches_removed_total
            .with_label_values(&[reason])
            .inc();
        self.match_metrics.active_matches.dec();
    }

    /// Record a match entering `phase`
    pub fn record_phase_transition(&self, phase: Phase) {
        let phase_str = match phase {
            Phase::Lobby => "lobby",
            Phase::TeamAssign => "team_assign",
            Phase::Staging => "staging",
            Phase::Active => "active",
            Phase::WallsDown => "walls_down",
        };

        self.match_metrics
            .phase_transitions_total
            .with_label_values(&[phase_str])
            .inc();
    }

    pub fn record_player_joined(&self) {
        self.player_metrics.players_joined_total.inc();
        self.player_metrics.players_in_matches.inc();
    }

    /// Record `count` players leaving, by command or by teardown
    pub fn record_players_left(&self, count: usize) {
        self.player_metrics.players_left_total.inc_by(count as u64);
        self.player_metrics.players_in_matches.sub(count as i64);
    }

    /// Record a refused join
    pub fn record_join_rejected(&self, error: &MatchError) {
        let reason = match error {
            MatchError::CapacityExceeded { .. } => "full",
            MatchError::AlreadyJoined { .. } => "already_joined",
            MatchError::MatchNotFound { .. } => "no_such_match",
            _ => "other",
        };

        self.player_metrics
            .joins_rejected_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Record a pass of the tick driver over every live match
    pub fn record_tick(&self, duration: Duration) {
        self.performance_metrics
            .tick_duration
            .observe(duration.as_secs_f64());
    }

    /// Record command-layer operation duration
    pub fn record_operation(&self, operation: &str, duration: Duration) {
        self.performance_metrics
            .operation_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }

    pub fn record_dispatch_failures(&self, count: usize) {
        if count > 0 {
            self.service_metrics
                .dispatch_failures_total
                .inc_by(count as u64);
        }
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("wallwars_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let dispatch_failures_total = IntCounter::new(
            "wallwars_dispatch_failures_total",
            "Host commands that failed to dispatch",
        )?;
        registry.register(Box::new(dispatch_failures_total.clone()))?;

        let health_status = IntGauge::new(
            "wallwars_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("wallwars_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            uptime_seconds,
            dispatch_failures_total,
            health_status,
            component_health,
        })
    }
}

impl MatchMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let active_matches = IntGauge::new("wallwars_active_matches", "Number of live matches")?;
        registry.register(Box::new(active_matches.clone()))?;

        let matches_created_total =
            IntCounter::new("wallwars_matches_created_total", "Total matches created")?;
        registry.register(Box::new(matches_created_total.clone()))?;

        let matches_removed_total = IntCounterVec::new(
            Opts::new("wallwars_matches_removed_total", "Total matches torn down"),
            &["reason"],
        )?;
        registry.register(Box::new(matches_removed_total.clone()))?;

        let phase_transitions_total = IntCounterVec::new(
            Opts::new(
                "wallwars_phase_transitions_total",
                "Phase transitions by phase entered",
            ),
            &["phase"],
        )?;
        registry.register(Box::new(phase_transitions_total.clone()))?;

        Ok(Self {
            active_matches,
            matches_created_total,
            matches_removed_total,
            phase_transitions_total,
        })
    }
}

impl PlayerMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let players_joined_total =
            IntCounter::new("wallwars_players_joined_total", "Total players joined")?;
        registry.register(Box::new(players_joined_total.clone()))?;

        let players_left_total =
            IntCounter::new("wallwars_players_left_total", "Total players left")?;
        registry.register(Box::new(players_left_total.clone()))?;

        let joins_rejected_total = IntCounterVec::new(
            Opts::new("wallwars_joins_rejected_total", "Refused join attempts"),
            &["reason"],
        )?;
        registry.register(Box::new(joins_rejected_total.clone()))?;

        let players_in_matches =
            IntGauge::new("wallwars_players_in_matches", "Players currently in a match")?;
        registry.register(Box::new(players_in_matches.clone()))?;

        Ok(Self {
            players_joined_total,
            players_left_total,
            joins_rejected_total,
            players_in_matches,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let tick_duration = Histogram::with_opts(
            HistogramOpts::new(
                "wallwars_tick_duration_seconds",
                "Time to tick every live match once",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05]),
        )?;
        registry.register(Box::new(tick_duration.clone()))?;

        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "wallwars_operation_duration_seconds",
                "Command operation duration",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        Ok(Self {
            tick_duration,
            operation_duration,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}
