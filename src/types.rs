//! Common types used throughout the match engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for players
pub type PlayerId = String;

/// Unique identifier for match instances
pub type MatchId = Uuid;

/// Identifier of a hosting world/dimension ("namespace:path")
pub type SpaceId = String;

/// A player as seen by the engine. The host owns the real entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A point in a space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Translate by a horizontal offset
    pub fn offset(&self, dx: f64, dz: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y,
            z: self.z + dz,
        }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

/// A point inside a specific space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub space: SpaceId,
    pub point: Point,
}

impl Location {
    pub fn new(space: impl Into<SpaceId>, point: Point) -> Self {
        Self {
            space: space.into(),
            point,
        }
    }
}

/// Axis-aligned box used for restraining players and lowering barriers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub min: Point,
    pub max: Point,
}

impl Region {
    /// Square region of side `size` centred on `center`, spanning the full build height
    pub fn square(center: Point, size: f64) -> Self {
        let half = size / 2.0;
        Self {
            min: Point::new(center.x - half, f64::MIN, center.z - half),
            max: Point::new(center.x + half, f64::MAX, center.z + half),
        }
    }

    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }
}

/// Message severity; the announcement sink decides formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Regular game message (green, bold)
    Info,
    /// Refusal or failure message (red, bold)
    Error,
}

/// Who receives a broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnouncementScope {
    /// Everyone on the server
    Global,
    /// Players of one match
    Match(String),
}

/// Lifecycle phase of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for players; runs the start countdown once someone joined
    Lobby,
    /// Countdown finished, teams are assigned on the next tick
    TeamAssign,
    /// Teams assigned, teams are moved to their plots on the next tick
    Staging,
    /// Teams are building; runs the walls countdown
    Active,
    /// Barriers lowered (terminal)
    WallsDown,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::WallsDown)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Lobby => write!(f, "Lobby"),
            Phase::TeamAssign => write!(f, "TeamAssign"),
            Phase::Staging => write!(f, "Staging"),
            Phase::Active => write!(f, "Active"),
            Phase::WallsDown => write!(f, "WallsDown"),
        }
    }
}

/// Chat color of a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamColor {
    Green,
    LightPurple,
    Aqua,
    Gray,
}

/// Snapshot of one team for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamInfo {
    pub slot: usize,
    pub name: String,
    pub label: String,
    pub color: TeamColor,
    pub friendly_fire: bool,
    pub members: Vec<String>,
}

/// Snapshot of a match, as reported by the admin "gamesinfo" command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchInfo {
    pub id: MatchId,
    pub name: String,
    pub players: Vec<String>,
    pub player_count: usize,
    pub capacity: usize,
    pub space: SpaceId,
    pub spawn: Point,
    pub phase: Phase,
    pub elapsed_ticks: u64,
    pub teams: Vec<TeamInfo>,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Display for MatchInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Game {}:", self.name)?;
        writeln!(f, "    Players: {:?}", self.players)?;
        writeln!(f, "    Player count: {}", self.player_count)?;
        writeln!(f, "    World: {}", self.space)?;
        writeln!(f, "    Spawn Coords: {}", self.spawn)?;
        write!(f, "    Phase: {} ({} ticks)", self.phase, self.elapsed_ticks)
    }
}
