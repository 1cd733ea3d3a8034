//! The four fixed teams of a match

use crate::host::HostCommand;
use crate::types::{Location, Player, Point, Region, TeamColor, TeamInfo};
use serde::{Deserialize, Serialize};

/// Number of teams in every match
pub const TEAM_COUNT: usize = 4;

/// Positional role of a team. Slot `i` receives roster members `i mod 4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamSlot {
    Lime,
    Pink,
    Cyan,
    Gray,
}

impl TeamSlot {
    pub const ALL: [TeamSlot; TEAM_COUNT] =
        [TeamSlot::Lime, TeamSlot::Pink, TeamSlot::Cyan, TeamSlot::Gray];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Slot for the `i`-th roster member in join order
    pub fn for_member(i: usize) -> Self {
        Self::ALL[i % TEAM_COUNT]
    }

    fn prefix(self) -> &'static str {
        match self {
            TeamSlot::Lime => "lime",
            TeamSlot::Pink => "pink",
            TeamSlot::Cyan => "cyan",
            TeamSlot::Gray => "gray",
        }
    }

    /// Chat prefix shown in front of member names
    pub fn label(self) -> &'static str {
        match self {
            TeamSlot::Lime => "LIME ",
            TeamSlot::Pink => "PINK ",
            TeamSlot::Cyan => "CYAN ",
            TeamSlot::Gray => "GRAY ",
        }
    }

    pub fn color(self) -> TeamColor {
        match self {
            TeamSlot::Lime => TeamColor::Green,
            TeamSlot::Pink => TeamColor::LightPurple,
            TeamSlot::Cyan => TeamColor::Aqua,
            TeamSlot::Gray => TeamColor::Gray,
        }
    }

    /// Quadrant of the arena the team's plot occupies, as (x, z) signs
    fn quadrant(self) -> (f64, f64) {
        match self {
            TeamSlot::Lime => (-1.0, -1.0),
            TeamSlot::Pink => (1.0, -1.0),
            TeamSlot::Cyan => (-1.0, 1.0),
            TeamSlot::Gray => (1.0, 1.0),
        }
    }

    /// Centre of this team's plot in an arena centred on `spawn`
    pub fn plot_center(self, spawn: Point, plot_size: f64) -> Point {
        let (sx, sz) = self.quadrant();
        spawn.offset(sx * plot_size / 2.0, sz * plot_size / 2.0)
    }
}

/// A labeled, colored group of roster members sharing a staging point
#[derive(Debug, Clone)]
pub struct Team {
    slot: TeamSlot,
    name: String,
    friendly_fire: bool,
    staging: Location,
    plot: Region,
    members: Vec<Player>,
}

impl Team {
    /// Create the team for `slot` of the match `match_name`. The staging point
    /// is the centre of the team's plot in the arena around `spawn`.
    pub fn new(
        slot: TeamSlot,
        match_name: &str,
        space: &str,
        spawn: Point,
        plot_size: f64,
        friendly_fire: bool,
    ) -> Self {
        let center = slot.plot_center(spawn, plot_size);
        Self {
            slot,
            name: format!("{}_{}", slot.prefix(), match_name),
            friendly_fire,
            staging: Location::new(space, center),
            plot: Region::square(center, plot_size),
            members: Vec::new(),
        }
    }

    /// All four teams of a match, indexed by slot
    pub fn roster_for(
        match_name: &str,
        space: &str,
        spawn: Point,
        plot_size: f64,
        friendly_fire: bool,
    ) -> [Team; TEAM_COUNT] {
        TeamSlot::ALL.map(|slot| Team::new(slot, match_name, space, spawn, plot_size, friendly_fire))
    }

    pub fn slot(&self) -> TeamSlot {
        self.slot
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &'static str {
        self.slot.label()
    }

    pub fn color(&self) -> TeamColor {
        self.slot.color()
    }

    pub fn friendly_fire(&self) -> bool {
        self.friendly_fire
    }

    pub fn staging(&self) -> &Location {
        &self.staging
    }

    pub fn plot(&self) -> &Region {
        &self.plot
    }

    pub fn members(&self) -> &[Player] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.members.iter().any(|p| p.id == player_id)
    }

    /// Append a player. No capacity check: the roster bounds team sizes.
    /// Returns false if the player already is a member.
    pub fn add_player(&mut self, player: Player) -> bool {
        if self.contains(&player.id) {
            return false;
        }
        self.members.push(player);
        true
    }

    /// Returns false if the player was not a member
    pub fn remove_player(&mut self, player_id: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|p| p.id != player_id);
        self.members.len() != before
    }

    /// Requests moving every member to the staging point and keeping them on
    /// the team plot. Membership is unchanged.
    pub fn teleport_members(&self) -> Vec<HostCommand> {
        self.members
            .iter()
            .flat_map(|member| {
                [
                    HostCommand::MoveTo {
                        player_id: member.id.clone(),
                        destination: self.staging.clone(),
                    },
                    HostCommand::Restrain {
                        player_id: member.id.clone(),
                        space: self.staging.space.clone(),
                        region: self.plot,
                    },
                ]
            })
            .collect()
    }

    pub fn info(&self) -> TeamInfo {
        TeamInfo {
            slot: self.slot.index(),
            name: self.name.clone(),
            label: self.label().to_string(),
            color: self.color(),
            friendly_fire: self.friendly_fire,
            members: self.members.iter().map(|p| p.name.clone()).collect(),
        }
    }
}
