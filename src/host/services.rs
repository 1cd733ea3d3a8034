//! Collaborator traits implemented by the hosting game server

use crate::error::Result;
use crate::host::commands::HostCommand;
use crate::types::{AnnouncementScope, Location, Region, Severity};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-player persistent storage
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Store the location a player had before joining a match
    async fn record_pre_join_location(&self, player_id: &str, origin: &Location) -> Result<()>;

    /// Forget the stored pre-join location
    async fn clear_pre_join_location(&self, player_id: &str) -> Result<()>;

    /// Read a boolean flag; unset flags read as false
    async fn has_flag(&self, player_id: &str, key: &str) -> Result<bool>;

    /// Write a boolean flag
    async fn set_flag(&self, player_id: &str, key: &str, value: bool) -> Result<()>;
}

/// Moving and restraining players
#[async_trait]
pub trait RelocationService: Send + Sync {
    async fn move_to(&self, player_id: &str, destination: &Location) -> Result<()>;

    async fn restrain(&self, player_id: &str, space: &str, region: &Region) -> Result<()>;

    /// Send the player back to the server lobby (their stored pre-join location)
    async fn return_to_lobby(&self, player_id: &str) -> Result<()>;

    /// Put the player in the server-wide default team
    async fn assign_default_team(&self, player_id: &str) -> Result<()>;

    /// Take the player out of the server-wide default team
    async fn remove_from_default_team(&self, player_id: &str) -> Result<()>;
}

/// Chat delivery
#[async_trait]
pub trait AnnouncementSink: Send + Sync {
    async fn broadcast(
        &self,
        scope: &AnnouncementScope,
        message: &str,
        severity: Severity,
    ) -> Result<()>;

    async fn send_to(&self, player_id: &str, message: &str, severity: Severity) -> Result<()>;
}

/// World-altering events
#[async_trait]
pub trait WorldEventTrigger: Send + Sync {
    /// Open the arena: remove the walls separating the team plots
    async fn lower_barriers(&self, space: &str, region: &Region) -> Result<()>;
}

/// Bundle of the four collaborators, used to execute [`HostCommand`]s
#[derive(Clone)]
pub struct HostServices {
    persistence: Arc<dyn PersistenceSink>,
    relocation: Arc<dyn RelocationService>,
    announcements: Arc<dyn AnnouncementSink>,
    world: Arc<dyn WorldEventTrigger>,
}

impl HostServices {
    pub fn new(
        persistence: Arc<dyn PersistenceSink>,
        relocation: Arc<dyn RelocationService>,
        announcements: Arc<dyn AnnouncementSink>,
        world: Arc<dyn WorldEventTrigger>,
    ) -> Self {
        Self {
            persistence,
            relocation,
            announcements,
            world,
        }
    }

    /// Use one object implementing every collaborator trait
    pub fn from_host<H>(host: Arc<H>) -> Self
    where
        H: PersistenceSink + RelocationService + AnnouncementSink + WorldEventTrigger + 'static,
    {
        Self {
            persistence: host.clone(),
            relocation: host.clone(),
            announcements: host.clone(),
            world: host,
        }
    }

    pub fn persistence(&self) -> &Arc<dyn PersistenceSink> {
        &self.persistence
    }

    pub fn relocation(&self) -> &Arc<dyn RelocationService> {
        &self.relocation
    }

    pub fn announcements(&self) -> &Arc<dyn AnnouncementSink> {
        &self.announcements
    }

    pub fn world(&self) -> &Arc<dyn WorldEventTrigger> {
        &self.world
    }

    /// Execute a single command
    pub async fn dispatch(&self, command: &HostCommand) -> Result<()> {
        match command {
            HostCommand::RecordPreJoinLocation { player_id, origin } => {
                self.persistence
                    .record_pre_join_location(player_id, origin)
                    .await
            }
            HostCommand::ClearPreJoinLocation { player_id } => {
                self.persistence.clear_pre_join_location(player_id).await
            }
            HostCommand::SetFlag {
                player_id,
                key,
                value,
            } => self.persistence.set_flag(player_id, key, *value).await,
            HostCommand::MoveTo {
                player_id,
                destination,
            } => self.relocation.move_to(player_id, destination).await,
            HostCommand::Restrain {
                player_id,
                space,
                region,
            } => self.relocation.restrain(player_id, space, region).await,
            HostCommand::ReturnToLobby { player_id } => {
                self.relocation.return_to_lobby(player_id).await
            }
            HostCommand::AssignDefaultTeam { player_id } => {
                self.relocation.assign_default_team(player_id).await
            }
            HostCommand::RemoveFromDefaultTeam { player_id } => {
                self.relocation.remove_from_default_team(player_id).await
            }
            HostCommand::Broadcast {
                scope,
                message,
                severity,
            } => {
                self.announcements
                    .broadcast(scope, message, *severity)
                    .await
            }
            HostCommand::SendTo {
                player_id,
                message,
                severity,
            } => {
                self.announcements
                    .send_to(player_id, message, *severity)
                    .await
            }
            HostCommand::LowerBarriers { space, region } => {
                self.world.lower_barriers(space, region).await
            }
        }
    }

    /// Execute commands in order. A failing command is logged and skipped;
    /// returns the number of failures.
    pub async fn dispatch_all(&self, commands: &[HostCommand]) -> usize {
        let mut failures = 0;
        for command in commands {
            match self.dispatch(command).await {
                Ok(()) => debug!("Dispatched host command {}", command.kind()),
                Err(e) => {
                    failures += 1;
                    warn!(
                        "Host command {} failed (player: {:?}): {}",
                        command.kind(),
                        command.player_id(),
                        e
                    );
                }
            }
        }
        failures
    }
}
