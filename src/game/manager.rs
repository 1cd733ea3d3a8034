//! Match manager: the command layer over every live match
//!
//! The manager owns the registry, turns player and admin requests into match
//! operations, and dispatches the resulting host commands while still holding
//! the match lock, so the commands of one match reach the host in the order
//! its operations ran. It also runs the tick driver and the cleanup task.

use crate::error::{MatchError, MatchResult};
use crate::game::instance::{Match, TickOutcome};
use crate::game::provider::{MatchConfigProvider, MatchConfiguration};
use crate::game::registry::{new_handle, InMemoryMatchRegistry, MatchHandle, MatchRegistry};
use crate::host::{HostCommand, HostServices};
use crate::metrics::MetricsCollector;
use crate::types::{Location, MatchId, MatchInfo, Phase, Player, Point, Severity, SpaceId};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Persistent flag marking a player as currently in a game
pub const JOINED_GAME_FLAG: &str = "joined_game";

/// Statistics about match manager operations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchManagerStats {
    /// Total number of matches created
    pub matches_created: u64,
    /// Total number of matches torn down
    pub matches_removed: u64,
    /// Total successful joins
    pub players_joined: u64,
    /// Total successful leaves, including teardown
    pub players_left: u64,
    /// Total refused joins
    pub joins_rejected: u64,
    /// Total phase transitions across all matches
    pub phase_transitions: u64,
    /// Tick driver passes
    pub ticks: u64,
    /// Host commands that failed to dispatch
    pub dispatch_failures: u64,
    /// Current number of live matches
    pub active_matches: usize,
    /// Current number of players in a match
    pub players_in_matches: usize,
}

/// The main match manager
#[derive(Clone)]
pub struct MatchManager {
    /// Live matches and the player index
    registry: Arc<dyn MatchRegistry>,
    /// Configuration for new matches
    config_provider: Arc<dyn MatchConfigProvider>,
    /// Collaborators executing host commands
    host: HostServices,
    /// Manager statistics
    stats: Arc<RwLock<MatchManagerStats>>,
    /// Metrics collector for recording performance data
    metrics_collector: Arc<MetricsCollector>,
}

impl MatchManager {
    /// Create a new match manager with an in-memory registry
    pub fn new(config_provider: Arc<dyn MatchConfigProvider>, host: HostServices) -> Self {
        let metrics_collector = Arc::new(MetricsCollector::new().unwrap_or_else(|_| {
            warn!("Failed to create metrics collector, using default");
            MetricsCollector::default()
        }));

        Self::with_metrics(config_provider, host, metrics_collector)
    }

    /// Create a new match manager with metrics collector
    pub fn with_metrics(
        config_provider: Arc<dyn MatchConfigProvider>,
        host: HostServices,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self::with_registry(
            Arc::new(InMemoryMatchRegistry::new()),
            config_provider,
            host,
            metrics_collector,
        )
    }

    /// Create with a custom registry
    pub fn with_registry(
        registry: Arc<dyn MatchRegistry>,
        config_provider: Arc<dyn MatchConfigProvider>,
        host: HostServices,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            registry,
            config_provider,
            host,
            stats: Arc::new(RwLock::new(MatchManagerStats::default())),
            metrics_collector,
        }
    }

    pub fn host(&self) -> &HostServices {
        &self.host
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics_collector
    }

    /// Create a match using the provider's configuration
    pub async fn create_match(&self, name: &str, space: &str) -> MatchResult<MatchId> {
        let config = self.config_provider.get_match_config()?;
        self.create_match_with_config(name, space, config).await
    }

    /// Create a match with an explicit configuration
    pub async fn create_match_with_config(
        &self,
        name: &str,
        space: &str,
        config: MatchConfiguration,
    ) -> MatchResult<MatchId> {
        self.config_provider.validate_config(&config)?;

        let game = Match::new(name, space, config)?;
        let id = game.id();
        let capacity = game.config().capacity;
        self.registry.register_match(name, new_handle(game))?;

        self.update_stats(|stats| stats.matches_created += 1)?;
        self.metrics_collector.record_match_created();

        info!(
            "Created match '{}' ({}) in {} with capacity {}",
            name, id, space, capacity
        );
        Ok(id)
    }

    /// Join a player to a match. The player is told the outcome either way.
    pub async fn join_player(
        &self,
        match_name: &str,
        player: Player,
        origin: Location,
    ) -> MatchResult<()> {
        let timer = self.metrics_collector.start_timer();
        let player_id = player.id.clone();

        let handle = match self.require_match(match_name) {
            Ok(handle) => handle,
            Err(e) => return Err(self.refuse_join(&player_id, match_name, e).await),
        };

        let mut game = handle.lock().await;
        match self.join_indexed(match_name, &handle, &mut game, player, origin) {
            Ok(mut commands) => {
                commands.push(HostCommand::SetFlag {
                    player_id: player_id.clone(),
                    key: JOINED_GAME_FLAG.to_string(),
                    value: true,
                });
                commands.push(HostCommand::tell(
                    &player_id,
                    format!("Joined the game {}!", match_name),
                    Severity::Info,
                ));

                self.update_stats(|stats| stats.players_joined += 1)?;
                self.metrics_collector.record_player_joined();
                self.dispatch(&commands).await;
                drop(game);

                self.metrics_collector
                    .record_operation("join", timer.stop());
                Ok(())
            }
            Err(e) => {
                drop(game);
                Err(self.refuse_join(&player_id, match_name, e).await)
            }
        }
    }

    /// Index the player, then join. Runs under the match lock. The index
    /// entry is rolled back if the match was torn down in the meantime or the
    /// join is refused.
    fn join_indexed(
        &self,
        match_name: &str,
        handle: &MatchHandle,
        game: &mut Match,
        player: Player,
        origin: Location,
    ) -> MatchResult<Vec<HostCommand>> {
        let player_id = player.id.clone();
        self.registry.index_player(&player_id, match_name)?;

        let joined = self
            .ensure_registered(match_name, handle)
            .and_then(|()| game.join(player, origin));
        if joined.is_err() {
            if let Err(e) = self.registry.unindex_player(&player_id) {
                error!("Failed to roll back index for '{}': {}", player_id, e);
            }
        }
        joined
    }

    /// Fails unless `handle` is still the match registered under `match_name`
    fn ensure_registered(&self, match_name: &str, handle: &MatchHandle) -> MatchResult<()> {
        match self.registry.get_match(match_name)? {
            Some(current) if Arc::ptr_eq(&current, handle) => Ok(()),
            _ => Err(MatchError::MatchNotFound {
                match_name: match_name.to_string(),
            }),
        }
    }

    async fn refuse_join(&self, player_id: &str, match_name: &str, e: MatchError) -> MatchError {
        warn!(
            "Refused join of '{}' to match '{}': {}",
            player_id, match_name, e
        );
        if let Err(stats_error) = self.update_stats(|stats| stats.joins_rejected += 1) {
            error!("Failed to record refused join: {}", stats_error);
        }
        self.metrics_collector.record_join_rejected(&e);
        self.dispatch(&[HostCommand::tell(
            player_id,
            join_refusal(&e, match_name),
            Severity::Error,
        )])
        .await;
        e
    }

    /// Take a player out of whatever match they are in. The player index
    /// decides membership; the persisted flag only mirrors it.
    pub async fn leave_player(&self, player_id: &str) -> MatchResult<()> {
        let timer = self.metrics_collector.start_timer();

        let Some(match_name) = self.registry.match_name_for(player_id)? else {
            return Err(self.refuse_leave(player_id).await);
        };
        let Some(handle) = self.registry.get_match(&match_name)? else {
            return Err(self.refuse_leave(player_id).await);
        };

        let mut game = handle.lock().await;
        let mut commands = match game.leave(player_id) {
            Ok((_, commands)) => commands,
            // Torn down while we waited for the lock
            Err(e) if e.is_not_found() => {
                drop(game);
                return Err(self.refuse_leave(player_id).await);
            }
            Err(e) => return Err(e),
        };
        self.registry.unindex_player(player_id)?;

        commands.push(HostCommand::SetFlag {
            player_id: player_id.to_string(),
            key: JOINED_GAME_FLAG.to_string(),
            value: false,
        });
        commands.push(HostCommand::tell(player_id, "Left the game!", Severity::Info));

        self.update_stats(|stats| stats.players_left += 1)?;
        self.metrics_collector.record_players_left(1);
        self.dispatch(&commands).await;
        drop(game);

        debug!("'{}' left '{}'", player_id, match_name);
        self.metrics_collector
            .record_operation("leave", timer.stop());
        Ok(())
    }

    /// Tell a player who is in no match so. A joined flag left set by an
    /// earlier failed write is cleared on the way.
    async fn refuse_leave(&self, player_id: &str) -> MatchError {
        let flagged = match self
            .host
            .persistence()
            .has_flag(player_id, JOINED_GAME_FLAG)
            .await
        {
            Ok(flagged) => flagged,
            Err(e) => {
                error!("Could not read joined flag for '{}': {}", player_id, e);
                return MatchError::Internal {
                    message: format!("Failed to read joined flag: {}", e),
                };
            }
        };

        let mut commands = Vec::new();
        if flagged {
            warn!("Clearing stale joined flag for '{}'", player_id);
            commands.push(HostCommand::SetFlag {
                player_id: player_id.to_string(),
                key: JOINED_GAME_FLAG.to_string(),
                value: false,
            });
        }
        commands.push(HostCommand::tell(
            player_id,
            "You are not in game!",
            Severity::Error,
        ));
        self.dispatch(&commands).await;

        debug!("Refused leave of '{}': not in a match", player_id);
        MatchError::PlayerNotFound {
            player_id: player_id.to_string(),
        }
    }

    /// Tick one match and dispatch what it produced
    pub async fn tick_match(&self, match_name: &str) -> MatchResult<TickOutcome> {
        let handle = self.require_match(match_name)?;
        self.tick_handle(match_name, &handle).await
    }

    async fn tick_handle(&self, match_name: &str, handle: &MatchHandle) -> MatchResult<TickOutcome> {
        let mut game = handle.lock().await;
        if game.is_closed() {
            return Ok(TickOutcome::Inert);
        }
        let report = game.tick();

        if let TickOutcome::Transitioned { from, to } = report.outcome {
            debug!("Match '{}' ticked from {} into {}", match_name, from, to);
            self.update_stats(|stats| stats.phase_transitions += 1)?;
            self.metrics_collector.record_phase_transition(to);
        }

        self.dispatch(&report.commands).await;
        Ok(report.outcome)
    }

    /// Tick every live match once. Returns the number of matches ticked.
    pub async fn tick_all(&self) -> MatchResult<usize> {
        let timer = self.metrics_collector.start_timer();
        let matches = self.registry.list_matches()?;

        let mut ticked = 0;
        for (name, handle) in &matches {
            match self.tick_handle(name, handle).await {
                Ok(_) => ticked += 1,
                Err(e) => error!("Error ticking match '{}': {}", name, e),
            }
        }

        self.update_stats(|stats| stats.ticks += 1)?;
        self.metrics_collector.record_tick(timer.stop());
        Ok(ticked)
    }

    /// Tear a match down: every member is forced out with full leave side
    /// effects and the match is deregistered. Returns the former members.
    pub async fn remove_game(&self, match_name: &str) -> MatchResult<Vec<Player>> {
        self.teardown(match_name, "teardown").await
    }

    async fn teardown(&self, match_name: &str, reason: &str) -> MatchResult<Vec<Player>> {
        let handle = self.require_match(match_name)?;
        let mut game = handle.lock().await;
        if game.is_closed() {
            return Err(MatchError::MatchNotFound {
                match_name: match_name.to_string(),
            });
        }

        let (players, mut commands) = game.drain_for_teardown();
        if let Err(e) = self.registry.deregister_match(match_name) {
            warn!("Could not deregister match '{}': {}", match_name, e);
            for player in &players {
                self.registry.unindex_player(&player.id)?;
            }
        }

        commands.extend(players.iter().map(|player| HostCommand::SetFlag {
            player_id: player.id.clone(),
            key: JOINED_GAME_FLAG.to_string(),
            value: false,
        }));

        let count = players.len();
        self.update_stats(|stats| {
            stats.matches_removed += 1;
            stats.players_left += count as u64;
        })?;
        self.metrics_collector.record_match_removed(reason);
        self.metrics_collector.record_players_left(count);
        self.dispatch(&commands).await;
        drop(game);

        info!(
            "Removed match '{}' ({}), {} players returned to lobby",
            match_name, reason, count
        );
        Ok(players)
    }

    /// Tear down matches that started and have since been abandoned
    pub async fn cleanup_finished_matches(&self) -> MatchResult<usize> {
        let mut finished = Vec::new();
        for (name, handle) in self.registry.list_matches()? {
            if handle.lock().await.is_finished() {
                finished.push(name);
            }
        }

        let mut cleaned = 0;
        for name in finished {
            match self.teardown(&name, "finished").await {
                Ok(_) => cleaned += 1,
                // Removed concurrently
                Err(e) if e.is_not_found() => {}
                Err(e) => error!("Error cleaning up match '{}': {}", name, e),
            }
        }

        if cleaned > 0 {
            info!("Cleaned up {} finished matches", cleaned);
        }
        Ok(cleaned)
    }

    /// Snapshot of every live match, ordered by name
    pub async fn games_info(&self) -> MatchResult<Vec<MatchInfo>> {
        let matches = self.registry.list_matches()?;
        let mut infos = Vec::with_capacity(matches.len());
        for (_, handle) in &matches {
            infos.push(handle.lock().await.info());
        }
        Ok(infos)
    }

    /// Snapshot of one match
    pub async fn get_match_info(&self, match_name: &str) -> MatchResult<MatchInfo> {
        let handle = self.require_match(match_name)?;
        let info = handle.lock().await.info();
        Ok(info)
    }

    /// Name of the match the player is in
    pub async fn find_match_of(&self, player_id: &str) -> MatchResult<Option<String>> {
        self.registry.match_name_for(player_id)
    }

    /// Move a match to another space; false if unchanged
    pub async fn set_space(&self, match_name: &str, space: impl Into<SpaceId>) -> MatchResult<bool> {
        let handle = self.require_match(match_name)?;
        let changed = handle.lock().await.set_space(space)?;
        if changed {
            info!("Match '{}' moved to a new space", match_name);
        }
        Ok(changed)
    }

    /// Move a match's spawn point; false if unchanged
    pub async fn set_spawn(&self, match_name: &str, spawn: Point) -> MatchResult<bool> {
        let handle = self.require_match(match_name)?;
        let changed = handle.lock().await.set_spawn(spawn)?;
        if changed {
            info!("Match '{}' spawn set to {}", match_name, spawn);
        }
        Ok(changed)
    }

    /// Phase of a match
    pub async fn phase_of(&self, match_name: &str) -> MatchResult<Phase> {
        let handle = self.require_match(match_name)?;
        let phase = handle.lock().await.phase();
        Ok(phase)
    }

    /// Start the tick driver. Runs one `tick_all` per period until shutdown;
    /// missed periods are caught up so no tick is skipped.
    pub fn start_tick_task(
        self: Arc<Self>,
        period: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(&self);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = manager.tick_all().await {
                            error!("Error during tick: {}", e);
                        }
                    }
                    _ = shutdown.recv() => {
                        info!("Tick driver stopping");
                        break;
                    }
                }
            }
        });

        info!("Started tick driver every {:?}", period);
        handle
    }

    /// Start the cleanup task that runs periodically
    pub fn start_cleanup_task(
        self: Arc<Self>,
        period: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(&self);

        let handle = tokio::spawn(async move {
            let mut cleanup_interval = interval(period);

            loop {
                tokio::select! {
                    _ = cleanup_interval.tick() => {
                        if let Err(e) = manager.cleanup_finished_matches().await {
                            error!("Error during match cleanup: {}", e);
                        }
                    }
                    _ = shutdown.recv() => break,
                }
            }
        });

        info!("Started match cleanup task");
        handle
    }

    /// Get current manager statistics
    pub async fn get_stats(&self) -> MatchResult<MatchManagerStats> {
        let matches = self.registry.list_matches()?;
        let mut players = 0;
        for (_, handle) in &matches {
            players += handle.lock().await.player_count();
        }

        let stats = {
            let mut stats = self
                .stats
                .write()
                .map_err(|_| MatchError::lock_poisoned("stats"))?;
            stats.active_matches = matches.len();
            stats.players_in_matches = players;
            stats.clone()
        };

        self.metrics_collector.update_from_manager_stats(&stats);
        Ok(stats)
    }

    fn require_match(&self, match_name: &str) -> MatchResult<MatchHandle> {
        self.registry
            .get_match(match_name)?
            .ok_or_else(|| MatchError::MatchNotFound {
                match_name: match_name.to_string(),
            })
    }

    fn update_stats(&self, update: impl FnOnce(&mut MatchManagerStats)) -> MatchResult<()> {
        let mut stats = self
            .stats
            .write()
            .map_err(|_| MatchError::lock_poisoned("stats"))?;
        update(&mut stats);
        Ok(())
    }

    async fn dispatch(&self, commands: &[HostCommand]) {
        if commands.is_empty() {
            return;
        }
        let failures = self.host.dispatch_all(commands).await;
        if failures > 0 {
            self.metrics_collector.record_dispatch_failures(failures);
            if let Err(e) = self.update_stats(|stats| stats.dispatch_failures += failures as u64) {
                error!("Failed to record dispatch failures: {}", e);
            }
        }
    }
}

/// Message shown to a player whose join was refused
fn join_refusal(error: &MatchError, match_name: &str) -> String {
    match error {
        MatchError::CapacityExceeded { .. } => format!("Game {} is full!", match_name),
        MatchError::AlreadyJoined { .. } => "You are already in a game!".to_string(),
        MatchError::MatchNotFound { .. } => format!("Game {} doesn't exist!", match_name),
        other => other.to_string(),
    }
}
