//! Wall Wars - Match lifecycle engine for a team-based minigame
//!
//! This crate runs named matches through their lifecycle (lobby, team
//! assignment, staging, active play and walls down), driven by a fixed-rate
//! tick. Side effects on the hosting game server go through the collaborator
//! traits in [`host`].

pub mod config;
pub mod error;
pub mod game;
pub mod host;
pub mod metrics;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{MatchError, MatchResult, Result};
pub use types::*;

// Re-export key components
pub use game::{Match, MatchConfigProvider, MatchConfiguration, MatchManager, StaticMatchConfigProvider};
pub use host::{HostCommand, HostServices};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
