//! Configuration management for the wallwars service
//!
//! This module handles configuration loading from environment variables and
//! TOML files, validation, and default values for the match engine.

pub mod app;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, EngineSettings, InitialMatch, ServiceSettings};
