//! In-memory host that records every request, for tests and simulations

use crate::error::Result;
use crate::host::commands::HostCommand;
use crate::host::services::{
    AnnouncementSink, PersistenceSink, RelocationService, WorldEventTrigger,
};
use crate::types::{AnnouncementScope, Location, PlayerId, Region, Severity};
use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Host double that keeps every call as a [`HostCommand`] in call order.
///
/// Flag and pre-join location writes are also applied to an in-memory store so
/// reads behave like a real persistence layer.
#[derive(Debug, Default)]
pub struct RecordingHost {
    commands: Mutex<Vec<HostCommand>>,
    flags: Mutex<HashMap<(PlayerId, String), bool>>,
    pre_join: Mutex<HashMap<PlayerId, Location>>,
    failing: Mutex<HashSet<&'static str>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future command of the given kind fail (see [`HostCommand::kind`]).
    /// `"has_flag"` makes flag reads fail.
    pub fn fail_on(&self, kind: &'static str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(kind);
        }
    }

    /// All recorded commands, in call order
    pub fn commands(&self) -> Vec<HostCommand> {
        self.commands
            .lock()
            .map(|commands| commands.clone())
            .unwrap_or_default()
    }

    /// Forget recorded commands (stored flags and locations are kept)
    pub fn clear(&self) {
        if let Ok(mut commands) = self.commands.lock() {
            commands.clear();
        }
    }

    /// Messages broadcast to a scope, in order
    pub fn broadcasts(&self, scope: &AnnouncementScope) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter_map(|command| match command {
                HostCommand::Broadcast {
                    scope: s, message, ..
                } if &s == scope => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Messages sent directly to a player, in order
    pub fn messages_to(&self, player_id: &str) -> Vec<(String, Severity)> {
        self.commands()
            .into_iter()
            .filter_map(|command| match command {
                HostCommand::SendTo {
                    player_id: p,
                    message,
                    severity,
                } if p == player_id => Some((message, severity)),
                _ => None,
            })
            .collect()
    }

    /// Recorded commands concerning one player
    pub fn commands_for(&self, player_id: &str) -> Vec<HostCommand> {
        self.commands()
            .into_iter()
            .filter(|command| command.player_id() == Some(player_id))
            .collect()
    }

    pub fn count_of_kind(&self, kind: &str) -> usize {
        self.commands()
            .iter()
            .filter(|command| command.kind() == kind)
            .count()
    }

    pub fn flag(&self, player_id: &str, key: &str) -> bool {
        self.flags
            .lock()
            .ok()
            .and_then(|flags| {
                flags
                    .get(&(player_id.to_string(), key.to_string()))
                    .copied()
            })
            .unwrap_or(false)
    }

    pub fn pre_join_location(&self, player_id: &str) -> Option<Location> {
        self.pre_join
            .lock()
            .ok()
            .and_then(|locations| locations.get(player_id).cloned())
    }

    fn record(&self, command: HostCommand) -> Result<()> {
        let kind = command.kind();
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(command);
        }
        self.check(kind)
    }

    fn check(&self, kind: &str) -> Result<()> {
        let failing = self
            .failing
            .lock()
            .map(|failing| failing.contains(kind))
            .unwrap_or(false);
        if failing {
            return Err(anyhow!("{} rejected by host", kind));
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceSink for RecordingHost {
    async fn record_pre_join_location(&self, player_id: &str, origin: &Location) -> Result<()> {
        self.record(HostCommand::RecordPreJoinLocation {
            player_id: player_id.to_string(),
            origin: origin.clone(),
        })?;
        if let Ok(mut locations) = self.pre_join.lock() {
            locations.insert(player_id.to_string(), origin.clone());
        }
        Ok(())
    }

    async fn clear_pre_join_location(&self, player_id: &str) -> Result<()> {
        self.record(HostCommand::ClearPreJoinLocation {
            player_id: player_id.to_string(),
        })?;
        if let Ok(mut locations) = self.pre_join.lock() {
            locations.remove(player_id);
        }
        Ok(())
    }

    async fn has_flag(&self, player_id: &str, key: &str) -> Result<bool> {
        self.check("has_flag")?;
        Ok(self.flag(player_id, key))
    }

    async fn set_flag(&self, player_id: &str, key: &str, value: bool) -> Result<()> {
        self.record(HostCommand::SetFlag {
            player_id: player_id.to_string(),
            key: key.to_string(),
            value,
        })?;
        if let Ok(mut flags) = self.flags.lock() {
            flags.insert((player_id.to_string(), key.to_string()), value);
        }
        Ok(())
    }
}

#[async_trait]
impl RelocationService for RecordingHost {
    async fn move_to(&self, player_id: &str, destination: &Location) -> Result<()> {
        self.record(HostCommand::MoveTo {
            player_id: player_id.to_string(),
            destination: destination.clone(),
        })
    }

    async fn restrain(&self, player_id: &str, space: &str, region: &Region) -> Result<()> {
        self.record(HostCommand::Restrain {
            player_id: player_id.to_string(),
            space: space.to_string(),
            region: *region,
        })
    }

    async fn return_to_lobby(&self, player_id: &str) -> Result<()> {
        self.record(HostCommand::ReturnToLobby {
            player_id: player_id.to_string(),
        })
    }

    async fn assign_default_team(&self, player_id: &str) -> Result<()> {
        self.record(HostCommand::AssignDefaultTeam {
            player_id: player_id.to_string(),
        })
    }

    async fn remove_from_default_team(&self, player_id: &str) -> Result<()> {
        self.record(HostCommand::RemoveFromDefaultTeam {
            player_id: player_id.to_string(),
        })
    }
}

#[async_trait]
impl AnnouncementSink for RecordingHost {
    async fn broadcast(
        &self,
        scope: &AnnouncementScope,
        message: &str,
        severity: Severity,
    ) -> Result<()> {
        self.record(HostCommand::Broadcast {
            scope: scope.clone(),
            message: message.to_string(),
            severity,
        })
    }

    async fn send_to(&self, player_id: &str, message: &str, severity: Severity) -> Result<()> {
        self.record(HostCommand::tell(player_id, message, severity))
    }
}

#[async_trait]
impl WorldEventTrigger for RecordingHost {
    async fn lower_barriers(&self, space: &str, region: &Region) -> Result<()> {
        self.record(HostCommand::LowerBarriers {
            space: space.to_string(),
            region: *region,
        })
    }
}
