//! Health check endpoints and monitoring
//!
//! This module provides health check functionality for the wallwars
//! service, including readiness and liveness probes.

use crate::game::manager::{MatchManager, MatchManagerStats};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Gauge value exported as `wallwars_health_status`
    pub fn as_gauge(&self) -> u8 {
        match self {
            HealthStatus::Healthy => 2,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 0,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "✅ healthy"),
            HealthStatus::Degraded => write!(f, "⚠️  degraded"),
            HealthStatus::Unhealthy => write!(f, "❌ unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Current timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    /// Service statistics
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional error message if unhealthy
    pub message: Option<String>,
    /// Check duration in milliseconds
    pub duration_ms: u64,
}

/// Service statistics for health reporting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceStats {
    /// Number of live matches
    pub active_matches: usize,
    /// Players currently in a match
    pub players_in_matches: usize,
    /// Matches created since service start
    pub matches_created: u64,
    /// Matches torn down since service start
    pub matches_removed: u64,
    /// Tick driver passes since service start
    pub ticks: u64,
    /// Host commands that failed to dispatch
    pub dispatch_failures: u64,
}

impl From<&MatchManagerStats> for ServiceStats {
    fn from(stats: &MatchManagerStats) -> Self {
        Self {
            active_matches: stats.active_matches,
            players_in_matches: stats.players_in_matches,
            matches_created: stats.matches_created,
            matches_removed: stats.matches_removed,
            ticks: stats.ticks,
            dispatch_failures: stats.dispatch_failures,
        }
    }
}

impl HealthCheck {
    /// Perform a comprehensive health check of the service
    pub async fn check(manager: &MatchManager, service_name: &str) -> Result<Self> {
        let mut checks = Vec::new();

        let manager_check = Self::check_match_manager(manager).await;
        let mut overall_status = manager_check.status.clone();
        checks.push(manager_check);

        let dispatch_check = Self::check_host_dispatch(manager).await;
        if dispatch_check.status != HealthStatus::Healthy && overall_status == HealthStatus::Healthy
        {
            overall_status = dispatch_check.status.clone();
        }
        checks.push(dispatch_check);

        let stats = match manager.get_stats().await {
            Ok(stats) => ServiceStats::from(&stats),
            Err(e) => {
                debug!("Failed to get manager stats for health check: {}", e);
                ServiceStats::default()
            }
        };

        Ok(HealthCheck {
            status: overall_status,
            service: service_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
            checks,
            stats,
        })
    }

    /// Simple liveness check: the manager answers
    pub async fn liveness_check(manager: &MatchManager) -> Result<HealthStatus> {
        match manager.get_stats().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(_) => Ok(HealthStatus::Unhealthy),
        }
    }

    /// Readiness check: every match can be inspected
    pub async fn readiness_check(manager: &MatchManager) -> Result<HealthStatus> {
        Ok(Self::check_match_manager(manager).await.status)
    }

    /// Check that the manager and every match lock are usable
    async fn check_match_manager(manager: &MatchManager) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = match manager.games_info().await {
            Ok(_) => (HealthStatus::Healthy, None),
            Err(e) => {
                error!("Match manager check failed: {}", e);
                (
                    HealthStatus::Unhealthy,
                    Some(format!("Cannot inspect matches: {}", e)),
                )
            }
        };

        ComponentCheck {
            name: "match_manager".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Degraded once host commands have started failing
    async fn check_host_dispatch(manager: &MatchManager) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = match manager.get_stats().await {
            Ok(stats) if stats.dispatch_failures == 0 => (HealthStatus::Healthy, None),
            Ok(stats) => (
                HealthStatus::Degraded,
                Some(format!(
                    "{} host commands failed to dispatch",
                    stats.dispatch_failures
                )),
            ),
            Err(e) => (HealthStatus::Unhealthy, Some(e.to_string())),
        };

        ComponentCheck {
            name: "host_dispatch".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize health check: {}", e))
    }
}
