//! Log-only host used by the standalone service
//!
//! The service runs the engine without a game server attached. Every request
//! is written to the tracing log; flags and pre-join locations are kept in
//! memory so the join/leave bookkeeping still works end to end.

use crate::error::Result;
use crate::host::services::{
    AnnouncementSink, PersistenceSink, RelocationService, WorldEventTrigger,
};
use crate::types::{AnnouncementScope, Location, PlayerId, Region, Severity};
use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct TracingHost {
    flags: RwLock<HashMap<(PlayerId, String), bool>>,
    pre_join: RwLock<HashMap<PlayerId, Location>>,
}

impl TracingHost {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceSink for TracingHost {
    async fn record_pre_join_location(&self, player_id: &str, origin: &Location) -> Result<()> {
        info!(
            "Recording pre-join location of '{}': {} in {}",
            player_id, origin.point, origin.space
        );
        self.pre_join
            .write()
            .map_err(|_| anyhow!("Failed to acquire pre-join lock"))?
            .insert(player_id.to_string(), origin.clone());
        Ok(())
    }

    async fn clear_pre_join_location(&self, player_id: &str) -> Result<()> {
        self.pre_join
            .write()
            .map_err(|_| anyhow!("Failed to acquire pre-join lock"))?
            .remove(player_id);
        Ok(())
    }

    async fn has_flag(&self, player_id: &str, key: &str) -> Result<bool> {
        let flags = self
            .flags
            .read()
            .map_err(|_| anyhow!("Failed to acquire flags lock"))?;
        Ok(flags
            .get(&(player_id.to_string(), key.to_string()))
            .copied()
            .unwrap_or(false))
    }

    async fn set_flag(&self, player_id: &str, key: &str, value: bool) -> Result<()> {
        self.flags
            .write()
            .map_err(|_| anyhow!("Failed to acquire flags lock"))?
            .insert((player_id.to_string(), key.to_string()), value);
        Ok(())
    }
}

#[async_trait]
impl RelocationService for TracingHost {
    async fn move_to(&self, player_id: &str, destination: &Location) -> Result<()> {
        info!(
            "Teleport '{}' to {} in {}",
            player_id, destination.point, destination.space
        );
        Ok(())
    }

    async fn restrain(&self, player_id: &str, space: &str, region: &Region) -> Result<()> {
        info!(
            "Restrain '{}' in {} between {} and {}",
            player_id, space, region.min, region.max
        );
        Ok(())
    }

    async fn return_to_lobby(&self, player_id: &str) -> Result<()> {
        let origin = self
            .pre_join
            .read()
            .map_err(|_| anyhow!("Failed to acquire pre-join lock"))?
            .get(player_id)
            .cloned();
        match origin {
            Some(origin) => info!(
                "Return '{}' to lobby at {} in {}",
                player_id, origin.point, origin.space
            ),
            None => warn!("Return '{}' to lobby: no pre-join location stored", player_id),
        }
        Ok(())
    }

    async fn assign_default_team(&self, player_id: &str) -> Result<()> {
        info!("Add '{}' to the default team", player_id);
        Ok(())
    }

    async fn remove_from_default_team(&self, player_id: &str) -> Result<()> {
        info!("Remove '{}' from the default team", player_id);
        Ok(())
    }
}

#[async_trait]
impl AnnouncementSink for TracingHost {
    async fn broadcast(
        &self,
        scope: &AnnouncementScope,
        message: &str,
        severity: Severity,
    ) -> Result<()> {
        match scope {
            AnnouncementScope::Global => info!("[broadcast/{:?}] {}", severity, message),
            AnnouncementScope::Match(name) => info!("[{}/{:?}] {}", name, severity, message),
        }
        Ok(())
    }

    async fn send_to(&self, player_id: &str, message: &str, severity: Severity) -> Result<()> {
        info!("[@{}/{:?}] {}", player_id, severity, message);
        Ok(())
    }
}

#[async_trait]
impl WorldEventTrigger for TracingHost {
    async fn lower_barriers(&self, space: &str, region: &Region) -> Result<()> {
        info!(
            "Lowering barriers in {} between {} and {}",
            space, region.min, region.max
        );
        Ok(())
    }
}
