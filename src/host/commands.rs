//! Requests the engine issues to the hosting game server
//!
//! Match operations never call the host while holding the match lock. They
//! return the commands they want executed and the manager dispatches them
//! after the lock is released, in emission order.

use crate::types::{AnnouncementScope, Location, PlayerId, Region, Severity, SpaceId};
use serde::{Deserialize, Serialize};

/// A fire-and-forget request to an external collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostCommand {
    /// Remember where the player was before joining so leave can restore it
    RecordPreJoinLocation {
        player_id: PlayerId,
        origin: Location,
    },
    ClearPreJoinLocation {
        player_id: PlayerId,
    },
    SetFlag {
        player_id: PlayerId,
        key: String,
        value: bool,
    },
    MoveTo {
        player_id: PlayerId,
        destination: Location,
    },
    /// Keep the player inside `region` until the barriers come down
    Restrain {
        player_id: PlayerId,
        space: SpaceId,
        region: Region,
    },
    ReturnToLobby {
        player_id: PlayerId,
    },
    AssignDefaultTeam {
        player_id: PlayerId,
    },
    RemoveFromDefaultTeam {
        player_id: PlayerId,
    },
    Broadcast {
        scope: AnnouncementScope,
        message: String,
        severity: Severity,
    },
    SendTo {
        player_id: PlayerId,
        message: String,
        severity: Severity,
    },
    LowerBarriers {
        space: SpaceId,
        region: Region,
    },
}

impl HostCommand {
    /// Broadcast an info message to the players of one match
    pub fn announce(match_name: &str, message: impl Into<String>) -> Self {
        HostCommand::Broadcast {
            scope: AnnouncementScope::Match(match_name.to_string()),
            message: message.into(),
            severity: Severity::Info,
        }
    }

    pub fn tell(player_id: &str, message: impl Into<String>, severity: Severity) -> Self {
        HostCommand::SendTo {
            player_id: player_id.to_string(),
            message: message.into(),
            severity,
        }
    }

    /// Player the command is about, if any
    pub fn player_id(&self) -> Option<&str> {
        match self {
            HostCommand::RecordPreJoinLocation { player_id, .. }
            | HostCommand::ClearPreJoinLocation { player_id }
            | HostCommand::SetFlag { player_id, .. }
            | HostCommand::MoveTo { player_id, .. }
            | HostCommand::Restrain { player_id, .. }
            | HostCommand::ReturnToLobby { player_id }
            | HostCommand::AssignDefaultTeam { player_id }
            | HostCommand::RemoveFromDefaultTeam { player_id }
            | HostCommand::SendTo { player_id, .. } => Some(player_id),
            HostCommand::Broadcast { .. } | HostCommand::LowerBarriers { .. } => None,
        }
    }

    /// Short name used for logs and metrics labels
    pub fn kind(&self) -> &'static str {
        match self {
            HostCommand::RecordPreJoinLocation { .. } => "record_pre_join_location",
            HostCommand::ClearPreJoinLocation { .. } => "clear_pre_join_location",
            HostCommand::SetFlag { .. } => "set_flag",
            HostCommand::MoveTo { .. } => "move_to",
            HostCommand::Restrain { .. } => "restrain",
            HostCommand::ReturnToLobby { .. } => "return_to_lobby",
            HostCommand::AssignDefaultTeam { .. } => "assign_default_team",
            HostCommand::RemoveFromDefaultTeam { .. } => "remove_from_default_team",
            HostCommand::Broadcast { .. } => "broadcast",
            HostCommand::SendTo { .. } => "send_to",
            HostCommand::LowerBarriers { .. } => "lower_barriers",
        }
    }
}
