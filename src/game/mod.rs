//! Match lifecycle engine
//!
//! This module contains the roster, the four teams, the phase clock and its
//! countdown schedules, the match aggregate tying them together, and the
//! manager that runs every live match.

pub mod clock;
pub mod instance;
pub mod manager;
pub mod provider;
pub mod registry;
pub mod roster;
pub mod schedule;
pub mod team;

pub use clock::{ClockStep, PhaseClock};
pub use instance::{Match, TickOutcome, TickReport};
pub use manager::{MatchManager, MatchManagerStats, JOINED_GAME_FLAG};
pub use provider::{MatchConfigProvider, MatchConfiguration, StaticMatchConfigProvider};
pub use registry::{InMemoryMatchRegistry, MatchHandle, MatchRegistry};
pub use roster::Roster;
pub use schedule::{CountdownSchedule, ScheduleStep};
pub use team::{Team, TeamSlot, TEAM_COUNT};
