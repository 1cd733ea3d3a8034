//! Match aggregate: roster, the four teams and the phase clock
//!
//! All state changes go through `&mut self`, so the caller's lock around a
//! [`Match`] is the single serialization point for join, leave and tick.
//! Operations return the host commands they want executed instead of calling
//! the host, which lets the caller release the lock before dispatching.

use crate::error::{MatchError, MatchResult};
use crate::game::clock::{ClockStep, PhaseClock};
use crate::game::provider::MatchConfiguration;
use crate::game::roster::Roster;
use crate::game::team::{Team, TeamSlot, TEAM_COUNT};
use crate::host::HostCommand;
use crate::types::{Location, MatchId, MatchInfo, Phase, Player, Point, Region, SpaceId};
use crate::utils::{current_timestamp, generate_match_id};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// What a tick did to the match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Empty lobby, countdown not running
    Held,
    /// Already in the terminal phase
    Inert,
    /// Countdown advanced within the current phase
    Advanced,
    /// Countdown or step finished and the phase moved on
    Transitioned { from: Phase, to: Phase },
}

/// Outcome of one tick plus the host commands it produced
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub outcome: TickOutcome,
    pub commands: Vec<HostCommand>,
}

impl TickReport {
    fn quiet(outcome: TickOutcome) -> Self {
        Self {
            outcome,
            commands: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Match {
    id: MatchId,
    name: String,
    space: SpaceId,
    config: MatchConfiguration,
    roster: Roster,
    teams: [Team; TEAM_COUNT],
    clock: PhaseClock,
    created_at: DateTime<Utc>,
    /// Set by teardown; a closed match accepts no one
    closed: bool,
}

impl Match {
    /// Create a match in Lobby with an empty roster
    pub fn new(
        name: impl Into<String>,
        space: impl Into<SpaceId>,
        config: MatchConfiguration,
    ) -> MatchResult<Self> {
        config.validate()?;
        let name = name.into();
        let space = space.into();
        let teams = Team::roster_for(
            &name,
            &space,
            config.spawn,
            config.plot_size,
            config.friendly_fire,
        );

        Ok(Self {
            id: generate_match_id(),
            roster: Roster::new(name.clone(), config.capacity),
            clock: PhaseClock::for_config(&config),
            teams,
            name,
            space,
            config,
            created_at: current_timestamp(),
            closed: false,
        })
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn space(&self) -> &str {
        &self.space
    }

    pub fn spawn(&self) -> Point {
        self.config.spawn
    }

    pub fn config(&self) -> &MatchConfiguration {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.clock.phase()
    }

    pub fn elapsed_ticks(&self) -> u64 {
        self.clock.elapsed_ticks()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn teams(&self) -> &[Team; TEAM_COUNT] {
        &self.teams
    }

    pub fn player_count(&self) -> usize {
        self.roster.len()
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.roster.contains(player_id)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Region whose barriers come down at the end of the walls countdown:
    /// the four plots around the spawn point.
    pub fn arena(&self) -> Region {
        Region::square(self.config.spawn, self.config.plot_size * 2.0)
    }

    /// Slot of the team holding the player, if any
    pub fn team_of(&self, player_id: &str) -> Option<TeamSlot> {
        self.teams
            .iter()
            .find(|team| team.contains(player_id))
            .map(Team::slot)
    }

    /// The match has started and everyone has left
    pub fn is_finished(&self) -> bool {
        self.phase() != Phase::Lobby && self.roster.is_empty()
    }

    /// Add a player to the roster. `origin` is where the player stood before
    /// joining and is handed to the persistence sink.
    pub fn join(&mut self, player: Player, origin: Location) -> MatchResult<Vec<HostCommand>> {
        if self.closed {
            return Err(MatchError::MatchNotFound {
                match_name: self.name.clone(),
            });
        }
        let player_id = player.id.clone();
        self.roster.add(player)?;

        info!(
            "Player '{}' joined match '{}' ({}/{}) in phase {}",
            player_id,
            self.name,
            self.roster.len(),
            self.roster.capacity(),
            self.phase()
        );

        Ok(vec![HostCommand::RecordPreJoinLocation { player_id, origin }])
    }

    /// Remove a player from the roster and from their team
    pub fn leave(&mut self, player_id: &str) -> MatchResult<(Player, Vec<HostCommand>)> {
        let player = self.roster.remove(player_id)?;
        for team in self.teams.iter_mut() {
            team.remove_player(player_id);
        }

        info!(
            "Player '{}' left match '{}' ({} remaining)",
            player_id,
            self.name,
            self.roster.len()
        );

        let commands = Self::leave_commands(player_id);
        Ok((player, commands))
    }

    fn leave_commands(player_id: &str) -> Vec<HostCommand> {
        vec![
            HostCommand::ReturnToLobby {
                player_id: player_id.to_string(),
            },
            HostCommand::AssignDefaultTeam {
                player_id: player_id.to_string(),
            },
            HostCommand::ClearPreJoinLocation {
                player_id: player_id.to_string(),
            },
        ]
    }

    /// Whether the match has been torn down
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Force every member out, with the same side effects as a leave, and
    /// close the match to further joins. Members are returned in join order.
    pub fn drain_for_teardown(&mut self) -> (Vec<Player>, Vec<HostCommand>) {
        self.closed = true;
        let players = self.roster.drain();
        for team in self.teams.iter_mut() {
            for player in &players {
                team.remove_player(&player.id);
            }
        }

        let commands = players
            .iter()
            .flat_map(|player| Self::leave_commands(&player.id))
            .collect();

        info!(
            "Drained {} players from match '{}' for teardown",
            players.len(),
            self.name
        );
        (players, commands)
    }

    /// Advance the match by one tick
    pub fn tick(&mut self) -> TickReport {
        match self.clock.tick(self.roster.is_empty()) {
            ClockStep::Held => TickReport::quiet(TickOutcome::Held),
            ClockStep::Inert => TickReport::quiet(TickOutcome::Inert),
            ClockStep::Advanced { announcement } => {
                let commands = announcement
                    .map(|message| vec![HostCommand::announce(&self.name, message)])
                    .unwrap_or_default();
                TickReport {
                    outcome: TickOutcome::Advanced,
                    commands,
                }
            }
            ClockStep::Transitioned {
                from,
                to,
                announcement,
            } => {
                info!("Match '{}' moved from {} to {}", self.name, from, to);

                let mut commands = Vec::new();
                if let Some(message) = announcement {
                    commands.push(HostCommand::announce(&self.name, message));
                }
                match (from, to) {
                    (Phase::TeamAssign, _) => commands.extend(self.assign_teams()),
                    (Phase::Staging, _) => commands.extend(self.stage_teams()),
                    (_, Phase::WallsDown) => commands.push(HostCommand::LowerBarriers {
                        space: self.space.clone(),
                        region: self.arena(),
                    }),
                    _ => {}
                }

                TickReport {
                    outcome: TickOutcome::Transitioned { from, to },
                    commands,
                }
            }
        }
    }

    /// Round-robin the roster over the teams in join order
    fn assign_teams(&mut self) -> Vec<HostCommand> {
        let mut commands = Vec::with_capacity(self.roster.len());
        for (i, player) in self.roster.members().iter().enumerate() {
            commands.push(HostCommand::RemoveFromDefaultTeam {
                player_id: player.id.clone(),
            });
            let slot = TeamSlot::for_member(i);
            self.teams[slot.index()].add_player(player.clone());
            debug!("Assigned '{}' to {:?} in '{}'", player.id, slot, self.name);
        }
        commands
    }

    fn stage_teams(&self) -> Vec<HostCommand> {
        self.teams
            .iter()
            .flat_map(Team::teleport_members)
            .collect()
    }

    /// Move the match to another space. Only allowed in Lobby; returns false
    /// if the space is unchanged.
    pub fn set_space(&mut self, space: impl Into<SpaceId>) -> MatchResult<bool> {
        let space = space.into();
        self.ensure_lobby()?;
        if space == self.space {
            return Ok(false);
        }
        self.space = space;
        self.rebuild_teams();
        Ok(true)
    }

    /// Move the spawn point. Only allowed in Lobby; returns false if the
    /// point is unchanged.
    pub fn set_spawn(&mut self, spawn: Point) -> MatchResult<bool> {
        self.ensure_lobby()?;
        if spawn == self.config.spawn {
            return Ok(false);
        }
        self.config.spawn = spawn;
        self.rebuild_teams();
        Ok(true)
    }

    fn ensure_lobby(&self) -> MatchResult<()> {
        if self.phase() != Phase::Lobby {
            return Err(MatchError::AlreadyStarted {
                match_name: self.name.clone(),
            });
        }
        Ok(())
    }

    // Teams are empty until assignment, so rebuilding only moves staging points
    fn rebuild_teams(&mut self) {
        self.teams = Team::roster_for(
            &self.name,
            &self.space,
            self.config.spawn,
            self.config.plot_size,
            self.config.friendly_fire,
        );
    }

    /// Snapshot for reporting
    pub fn info(&self) -> MatchInfo {
        MatchInfo {
            id: self.id,
            name: self.name.clone(),
            players: self.roster.members().iter().map(|p| p.name.clone()).collect(),
            player_count: self.roster.len(),
            capacity: self.roster.capacity(),
            space: self.space.clone(),
            spawn: self.config.spawn,
            phase: self.phase(),
            elapsed_ticks: self.elapsed_ticks(),
            teams: self.teams.iter().map(Team::info).collect(),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SPACE: &str = "minecraft:overworld";

    /// One-second countdowns at one tick per second
    fn quick_config(capacity: usize) -> MatchConfiguration {
        MatchConfiguration {
            capacity,
            lobby_countdown_seconds: 1,
            walls_countdown_seconds: 1,
            ticks_per_second: 1,
            ..MatchConfiguration::standard()
        }
    }

    fn origin() -> Location {
        Location::new(SPACE, Point::new(100.0, 64.0, 100.0))
    }

    fn player(id: &str) -> Player {
        Player::new(id, id.to_uppercase())
    }

    fn run_until(game: &mut Match, phase: Phase) -> Vec<HostCommand> {
        let mut commands = Vec::new();
        for _ in 0..100 {
            if game.phase() == phase {
                return commands;
            }
            commands.extend(game.tick().commands);
        }
        panic!("match never reached {}", phase);
    }

    fn member_ids(team: &Team) -> Vec<&str> {
        team.members().iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_round_robin_assignment() {
        let mut game = Match::new("arena", SPACE, quick_config(20)).unwrap();
        for id in ["a", "b", "c", "d", "e"] {
            game.join(player(id), origin()).unwrap();
        }

        run_until(&mut game, Phase::TeamAssign);
        let report = game.tick();
        assert_eq!(
            report.outcome,
            TickOutcome::Transitioned {
                from: Phase::TeamAssign,
                to: Phase::Staging
            }
        );
        assert_eq!(report.commands.len(), 5);
        assert!(report
            .commands
            .iter()
            .all(|c| matches!(c, HostCommand::RemoveFromDefaultTeam { .. })));

        let teams = game.teams();
        assert_eq!(member_ids(&teams[0]), vec!["a", "e"]);
        assert_eq!(member_ids(&teams[1]), vec!["b"]);
        assert_eq!(member_ids(&teams[2]), vec!["c"]);
        assert_eq!(member_ids(&teams[3]), vec!["d"]);
        assert_eq!(game.team_of("e"), Some(TeamSlot::Lime));
    }

    #[test]
    fn test_capacity_two() {
        let mut game = Match::new("arena", SPACE, quick_config(2)).unwrap();
        game.join(player("a"), origin()).unwrap();
        game.join(player("b"), origin()).unwrap();
        assert!(matches!(
            game.join(player("c"), origin()),
            Err(MatchError::CapacityExceeded { capacity: 2, .. })
        ));
        assert_eq!(game.player_count(), 2);

        game.leave("a").unwrap();
        let commands = game.join(player("c"), origin()).unwrap();
        assert_eq!(
            commands,
            vec![HostCommand::RecordPreJoinLocation {
                player_id: "c".to_string(),
                origin: origin()
            }]
        );
        let ids: Vec<&str> = game.roster().members().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_leave_side_effects() {
        let mut game = Match::new("arena", SPACE, quick_config(4)).unwrap();
        game.join(player("a"), origin()).unwrap();

        let (left, commands) = game.leave("a").unwrap();
        assert_eq!(left.id, "a");
        let kinds: Vec<&str> = commands.iter().map(HostCommand::kind).collect();
        assert_eq!(
            kinds,
            vec!["return_to_lobby", "assign_default_team", "clear_pre_join_location"]
        );

        assert!(matches!(
            game.leave("a"),
            Err(MatchError::PlayerNotFound { .. })
        ));
    }

    #[test]
    fn test_leave_removes_from_team() {
        let mut game = Match::new("arena", SPACE, quick_config(4)).unwrap();
        game.join(player("a"), origin()).unwrap();
        game.join(player("b"), origin()).unwrap();
        run_until(&mut game, Phase::Active);

        assert_eq!(game.team_of("b"), Some(TeamSlot::Pink));
        game.leave("b").unwrap();
        assert_eq!(game.team_of("b"), None);
        assert!(game.teams()[1].is_empty());
        assert!(!game.contains("b"));
    }

    #[test]
    fn test_staging_teleports_teams() {
        let mut game = Match::new("arena", SPACE, quick_config(4)).unwrap();
        game.join(player("a"), origin()).unwrap();
        run_until(&mut game, Phase::Staging);

        let report = game.tick();
        assert_eq!(game.phase(), Phase::Active);
        assert_eq!(
            report.commands,
            vec![
                HostCommand::MoveTo {
                    player_id: "a".to_string(),
                    destination: game.teams()[0].staging().clone(),
                },
                HostCommand::Restrain {
                    player_id: "a".to_string(),
                    space: SPACE.to_string(),
                    region: *game.teams()[0].plot(),
                },
            ]
        );
    }

    #[test]
    fn test_walls_down() {
        let mut game = Match::new("arena", SPACE, quick_config(4)).unwrap();
        game.join(player("a"), origin()).unwrap();
        run_until(&mut game, Phase::Active);

        let report = game.tick();
        assert_eq!(
            report.commands,
            vec![HostCommand::announce("arena", "Walls will go down in 1 second!")]
        );

        let report = game.tick();
        assert_eq!(
            report.outcome,
            TickOutcome::Transitioned {
                from: Phase::Active,
                to: Phase::WallsDown
            }
        );
        assert_eq!(
            report.commands,
            vec![
                HostCommand::announce("arena", "Walls go down!"),
                HostCommand::LowerBarriers {
                    space: SPACE.to_string(),
                    region: game.arena(),
                },
            ]
        );

        for _ in 0..10 {
            assert_eq!(game.tick(), TickReport::quiet(TickOutcome::Inert));
        }
        assert_eq!(game.phase(), Phase::WallsDown);
        assert_eq!(game.elapsed_ticks(), 0);
    }

    #[test]
    fn test_lobby_start_announcement() {
        let mut game = Match::new("arena", SPACE, quick_config(4)).unwrap();
        assert_eq!(game.tick().outcome, TickOutcome::Held);

        game.join(player("a"), origin()).unwrap();
        let report = game.tick();
        assert_eq!(report.outcome, TickOutcome::Advanced);
        assert_eq!(report.commands, vec![HostCommand::announce("arena", "1 second")]);
        assert_eq!(game.elapsed_ticks(), 1);

        let report = game.tick();
        assert_eq!(report.commands, vec![HostCommand::announce("arena", "Start!")]);
        assert_eq!(game.phase(), Phase::TeamAssign);
    }

    #[test]
    fn test_late_joiner_stays_teamless() {
        let mut game = Match::new("arena", SPACE, quick_config(4)).unwrap();
        game.join(player("a"), origin()).unwrap();
        run_until(&mut game, Phase::Active);

        game.join(player("late"), origin()).unwrap();
        assert!(game.contains("late"));
        assert_eq!(game.team_of("late"), None);
    }

    #[test]
    fn test_drain_for_teardown() {
        let mut game = Match::new("arena", SPACE, quick_config(4)).unwrap();
        game.join(player("a"), origin()).unwrap();
        game.join(player("b"), origin()).unwrap();
        run_until(&mut game, Phase::Active);

        let (players, commands) = game.drain_for_teardown();
        assert_eq!(players.len(), 2);
        assert_eq!(commands.len(), 6);
        assert_eq!(commands[3].player_id(), Some("b"));
        assert!(game.roster().is_empty());
        assert!(game.teams().iter().all(Team::is_empty));
        assert!(game.is_finished());
        assert!(game.is_closed());
    }

    #[test]
    fn test_closed_match_refuses_joins() {
        let mut game = Match::new("arena", SPACE, quick_config(4)).unwrap();
        game.join(player("a"), origin()).unwrap();
        game.drain_for_teardown();

        assert_eq!(
            game.join(player("b"), origin()),
            Err(MatchError::MatchNotFound {
                match_name: "arena".to_string()
            })
        );
        assert!(game.roster().is_empty());
    }

    #[test]
    fn test_admin_setters_lobby_only() {
        let mut game = Match::new("arena", SPACE, quick_config(4)).unwrap();
        assert_eq!(game.set_space(SPACE), Ok(false));
        assert_eq!(game.set_space("minecraft:the_nether"), Ok(true));
        assert_eq!(game.teams()[0].staging().space, "minecraft:the_nether");

        let spawn = Point::new(10.0, 70.0, 10.0);
        assert_eq!(game.set_spawn(spawn), Ok(true));
        assert_eq!(game.set_spawn(spawn), Ok(false));
        assert!(game.arena().contains(&spawn));

        game.join(player("a"), origin()).unwrap();
        run_until(&mut game, Phase::TeamAssign);
        assert!(matches!(
            game.set_spawn(Point::default()),
            Err(MatchError::AlreadyStarted { .. })
        ));
    }

    #[test]
    fn test_info_snapshot() {
        let mut game = Match::new("arena", SPACE, quick_config(4)).unwrap();
        game.join(player("a"), origin()).unwrap();

        let info = game.info();
        assert_eq!(info.name, "arena");
        assert_eq!(info.players, vec!["A"]);
        assert_eq!(info.player_count, 1);
        assert_eq!(info.capacity, 4);
        assert_eq!(info.phase, Phase::Lobby);
        assert_eq!(info.teams.len(), TEAM_COUNT);
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        let result = Match::new("arena", SPACE, quick_config(0));
        assert!(matches!(
            result,
            Err(MatchError::InvalidConfiguration { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_teams_partition_roster(players in 1usize..20) {
            let mut game = Match::new("arena", SPACE, quick_config(20)).unwrap();
            for i in 0..players {
                game.join(player(&format!("p{}", i)), origin()).unwrap();
            }
            run_until(&mut game, Phase::Staging);

            let sizes: Vec<usize> = game.teams().iter().map(Team::len).collect();
            prop_assert_eq!(sizes.iter().sum::<usize>(), players);
            let max = *sizes.iter().max().unwrap();
            let min = *sizes.iter().min().unwrap();
            prop_assert!(max - min <= 1);
            for (i, member) in game.roster().members().iter().enumerate() {
                prop_assert_eq!(game.team_of(&member.id), Some(TeamSlot::for_member(i)));
            }
        }
    }
}
