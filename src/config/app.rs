//! Main application configuration
//!
//! This module defines the primary configuration structures for the wallwars
//! service, including environment variable and TOML file loading and validation.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub engine: EngineSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Port for the metrics and health endpoints
    pub metrics_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Match engine settings, applied to every match created by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Tick rate of the driver
    pub ticks_per_second: u64,
    /// Maximum players per match
    pub max_players: usize,
    /// Length of the pre-match countdown in seconds
    pub lobby_countdown_seconds: u64,
    /// Length of the walls countdown in seconds
    pub walls_countdown_seconds: u64,
    /// Side length of one team plot in blocks
    pub plot_size: f64,
    /// Interval between finished-match cleanups in seconds
    pub cleanup_interval_seconds: u64,
    /// Matches created at start-up, as (name, space) pairs
    pub initial_matches: Vec<InitialMatch>,
}

/// A match created when the service starts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialMatch {
    pub name: String,
    pub space: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "wallwars".to_string(),
            log_level: "info".to_string(),
            metrics_port: 9464,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            ticks_per_second: 20,
            max_players: 20,
            lobby_countdown_seconds: 300, // 5 minutes
            walls_countdown_seconds: 300, // 5 minutes
            plot_size: 360.0,
            cleanup_interval_seconds: 60,
            initial_matches: Vec::new(),
        }
    }
}

/// Parse an environment variable into `target` if it is set
fn env_override<T: std::str::FromStr>(key: &str, target: &mut T) -> Result<()> {
    if let Ok(value) = env::var(key) {
        *target = value
            .parse()
            .map_err(|_| anyhow!("Invalid {} value: {}", key, value))?;
    }
    Ok(())
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&contents)?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration file")
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        env_override("METRICS_PORT", &mut self.service.metrics_port)?;
        env_override(
            "SHUTDOWN_TIMEOUT_SECONDS",
            &mut self.service.shutdown_timeout_seconds,
        )?;

        // Engine settings
        env_override("TICKS_PER_SECOND", &mut self.engine.ticks_per_second)?;
        env_override("MAX_PLAYERS", &mut self.engine.max_players)?;
        env_override(
            "LOBBY_COUNTDOWN_SECONDS",
            &mut self.engine.lobby_countdown_seconds,
        )?;
        env_override(
            "WALLS_COUNTDOWN_SECONDS",
            &mut self.engine.walls_countdown_seconds,
        )?;
        env_override("PLOT_SIZE", &mut self.engine.plot_size)?;
        env_override(
            "CLEANUP_INTERVAL_SECONDS",
            &mut self.engine.cleanup_interval_seconds,
        )?;
        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get cleanup interval as Duration
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.engine.cleanup_interval_seconds)
    }

    /// Get the wall-clock period of one tick
    pub fn tick_period(&self) -> Duration {
        crate::utils::tick_period(self.engine.ticks_per_second)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.metrics_port == 0 {
        return Err(anyhow!("Metrics port cannot be 0"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    // Validate engine settings
    if config.engine.ticks_per_second == 0 || config.engine.ticks_per_second > 1000 {
        return Err(anyhow!("Ticks per second must be between 1 and 1000"));
    }
    if config.engine.max_players == 0 {
        return Err(anyhow!("Max players must be greater than 0"));
    }
    if config.engine.lobby_countdown_seconds == 0 || config.engine.walls_countdown_seconds == 0 {
        return Err(anyhow!("Countdowns must be greater than 0"));
    }
    if config.engine.plot_size <= 0.0 {
        return Err(anyhow!("Plot size must be positive"));
    }
    if config.engine.cleanup_interval_seconds == 0 {
        return Err(anyhow!("Cleanup interval must be greater than 0"));
    }

    Ok(())
}
