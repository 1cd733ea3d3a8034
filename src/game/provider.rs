//! Match configuration and the provider the manager reads it from
//!
//! Capacity, spawn point, plot size and countdown lengths are supplied when a
//! match is created. The provider validates them once so a match never has to.

use crate::config::EngineSettings;
use crate::error::{MatchError, MatchResult};
use crate::types::Point;
use crate::utils::{seconds_to_ticks, TICKS_PER_SECOND};
use serde::{Deserialize, Serialize};

/// Configuration of a single match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfiguration {
    /// Maximum number of players in the roster
    pub capacity: usize,
    /// Where players wait before the start; centre of the arena
    pub spawn: Point,
    /// Side length of one team plot
    pub plot_size: f64,
    /// Pre-match countdown length in seconds
    pub lobby_countdown_seconds: u64,
    /// Walls countdown length in seconds
    pub walls_countdown_seconds: u64,
    /// Tick rate used to convert the countdowns
    pub ticks_per_second: u64,
    /// Whether team members can hurt each other
    pub friendly_fire: bool,
}

impl MatchConfiguration {
    /// The standard Wall Wars match: 20 players, two five minute countdowns
    pub fn standard() -> Self {
        Self {
            capacity: 20,
            spawn: Point::new(0.0, 60.0, 0.0),
            plot_size: 60.0 * 6.0,
            lobby_countdown_seconds: 5 * 60,
            walls_countdown_seconds: 5 * 60,
            ticks_per_second: TICKS_PER_SECOND,
            friendly_fire: false,
        }
    }

    /// Build from the service's engine settings
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            capacity: settings.max_players,
            plot_size: settings.plot_size,
            lobby_countdown_seconds: settings.lobby_countdown_seconds,
            walls_countdown_seconds: settings.walls_countdown_seconds,
            ticks_per_second: settings.ticks_per_second,
            ..Self::standard()
        }
    }

    pub fn lobby_countdown_ticks(&self) -> u64 {
        seconds_to_ticks(self.lobby_countdown_seconds, self.ticks_per_second)
    }

    pub fn walls_countdown_ticks(&self) -> u64 {
        seconds_to_ticks(self.walls_countdown_seconds, self.ticks_per_second)
    }

    /// Check the configuration can drive a match
    pub fn validate(&self) -> MatchResult<()> {
        if self.capacity == 0 {
            return Err(invalid("Match capacity must be greater than 0"));
        }
        if self.ticks_per_second == 0 {
            return Err(invalid("Ticks per second must be greater than 0"));
        }
        if self.lobby_countdown_seconds == 0 || self.walls_countdown_seconds == 0 {
            return Err(invalid("Countdowns must last at least one second"));
        }
        if !(self.plot_size > 0.0) {
            return Err(invalid("Plot size must be positive"));
        }
        Ok(())
    }
}

impl Default for MatchConfiguration {
    fn default() -> Self {
        Self::standard()
    }
}

fn invalid(message: &str) -> MatchError {
    MatchError::InvalidConfiguration {
        message: message.to_string(),
    }
}

/// Trait for providing match configurations
pub trait MatchConfigProvider: Send + Sync {
    /// Configuration for a newly created match
    fn get_match_config(&self) -> MatchResult<MatchConfiguration>;

    /// Validate a configuration before it is handed out
    fn validate_config(&self, config: &MatchConfiguration) -> MatchResult<()> {
        config.validate()
    }
}

/// Provider handing out one fixed configuration
#[derive(Debug, Clone)]
pub struct StaticMatchConfigProvider {
    config: MatchConfiguration,
}

impl StaticMatchConfigProvider {
    /// Provider with the standard configuration
    pub fn new() -> Self {
        Self {
            config: MatchConfiguration::standard(),
        }
    }

    /// Provider with a custom configuration
    pub fn with_config(config: MatchConfiguration) -> MatchResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Replace the configuration used for future matches
    pub fn update_config(&mut self, config: MatchConfiguration) -> MatchResult<()> {
        self.validate_config(&config)?;
        self.config = config;
        Ok(())
    }
}

impl Default for StaticMatchConfigProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchConfigProvider for StaticMatchConfigProvider {
    fn get_match_config(&self) -> MatchResult<MatchConfiguration> {
        Ok(self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_configuration() {
        let config = MatchConfiguration::standard();
        assert_eq!(config.capacity, 20);
        assert_eq!(config.plot_size, 360.0);
        assert_eq!(config.lobby_countdown_ticks(), 6000);
        assert_eq!(config.walls_countdown_ticks(), 6000);
        assert!(!config.friendly_fire);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_settings() {
        let settings = EngineSettings {
            max_players: 8,
            lobby_countdown_seconds: 30,
            ticks_per_second: 10,
            ..EngineSettings::default()
        };
        let config = MatchConfiguration::from_settings(&settings);
        assert_eq!(config.capacity, 8);
        assert_eq!(config.lobby_countdown_ticks(), 300);
        assert_eq!(config.spawn, Point::new(0.0, 60.0, 0.0));
    }

    #[test]
    fn test_config_validation() {
        let mut config = MatchConfiguration::standard();
        config.capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(MatchError::InvalidConfiguration { .. })
        ));

        let mut config = MatchConfiguration::standard();
        config.plot_size = f64::NAN;
        assert!(config.validate().is_err());

        assert!(StaticMatchConfigProvider::with_config(config).is_err());
    }

    #[test]
    fn test_update_config() {
        let mut provider = StaticMatchConfigProvider::new();

        let mut config = MatchConfiguration::standard();
        config.capacity = 4;
        assert!(provider.update_config(config).is_ok());
        assert_eq!(provider.get_match_config().unwrap().capacity, 4);

        let mut bad = MatchConfiguration::standard();
        bad.walls_countdown_seconds = 0;
        assert!(provider.update_config(bad).is_err());
        assert_eq!(provider.get_match_config().unwrap().capacity, 4);
    }
}
