//! Registry of live matches and the player -> match reverse index

use crate::error::{MatchError, MatchResult};
use crate::game::instance::Match;
use crate::types::PlayerId;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

/// Shared handle to one match. The mutex guards roster, teams and clock as
/// one unit, and is held until the host commands of an operation have been
/// dispatched so commands for one match never interleave.
pub type MatchHandle = Arc<Mutex<Match>>;

/// Wrap a match in a handle
pub fn new_handle(game: Match) -> MatchHandle {
    Arc::new(Mutex::new(game))
}

/// Trait for looking up live matches and the match a player is in
pub trait MatchRegistry: Send + Sync {
    /// Register a match under `name`
    fn register_match(&self, name: &str, handle: MatchHandle) -> MatchResult<()>;

    /// Remove a match and every index entry pointing at it
    fn deregister_match(&self, name: &str) -> MatchResult<MatchHandle>;

    /// Look up a match by name
    fn get_match(&self, name: &str) -> MatchResult<Option<MatchHandle>>;

    /// Name of the match the player is indexed to
    fn match_name_for(&self, player_id: &str) -> MatchResult<Option<String>>;

    /// All live matches ordered by name
    fn list_matches(&self) -> MatchResult<Vec<(String, MatchHandle)>>;

    /// Record that the player belongs to `match_name`. Fails with
    /// `AlreadyJoined` if the player is indexed to any match.
    fn index_player(&self, player_id: &str, match_name: &str) -> MatchResult<()>;

    /// Forget the player's match. Returns the match name it pointed at.
    fn unindex_player(&self, player_id: &str) -> MatchResult<Option<String>>;

    /// Match the player is in, if any
    fn find_match_containing(&self, player_id: &str) -> MatchResult<Option<MatchHandle>> {
        match self.match_name_for(player_id)? {
            Some(name) => self.get_match(&name),
            None => Ok(None),
        }
    }
}

/// Registry backed by in-process maps
#[derive(Default)]
pub struct InMemoryMatchRegistry {
    matches: RwLock<BTreeMap<String, MatchHandle>>,
    players: RwLock<HashMap<PlayerId, String>>,
}

impl InMemoryMatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed players across all matches
    pub fn indexed_players(&self) -> MatchResult<usize> {
        let players = self
            .players
            .read()
            .map_err(|_| MatchError::lock_poisoned("player index"))?;
        Ok(players.len())
    }
}

impl MatchRegistry for InMemoryMatchRegistry {
    fn register_match(&self, name: &str, handle: MatchHandle) -> MatchResult<()> {
        let mut matches = self
            .matches
            .write()
            .map_err(|_| MatchError::lock_poisoned("matches"))?;
        if matches.contains_key(name) {
            return Err(MatchError::MatchAlreadyExists {
                match_name: name.to_string(),
            });
        }
        matches.insert(name.to_string(), handle);
        Ok(())
    }

    fn deregister_match(&self, name: &str) -> MatchResult<MatchHandle> {
        let handle = {
            let mut matches = self
                .matches
                .write()
                .map_err(|_| MatchError::lock_poisoned("matches"))?;
            matches.remove(name).ok_or_else(|| MatchError::MatchNotFound {
                match_name: name.to_string(),
            })?
        };

        let mut players = self
            .players
            .write()
            .map_err(|_| MatchError::lock_poisoned("player index"))?;
        players.retain(|_, match_name| match_name != name);
        Ok(handle)
    }

    fn get_match(&self, name: &str) -> MatchResult<Option<MatchHandle>> {
        let matches = self
            .matches
            .read()
            .map_err(|_| MatchError::lock_poisoned("matches"))?;
        Ok(matches.get(name).cloned())
    }

    fn match_name_for(&self, player_id: &str) -> MatchResult<Option<String>> {
        let players = self
            .players
            .read()
            .map_err(|_| MatchError::lock_poisoned("player index"))?;
        Ok(players.get(player_id).cloned())
    }

    fn list_matches(&self) -> MatchResult<Vec<(String, MatchHandle)>> {
        let matches = self
            .matches
            .read()
            .map_err(|_| MatchError::lock_poisoned("matches"))?;
        Ok(matches
            .iter()
            .map(|(name, handle)| (name.clone(), Arc::clone(handle)))
            .collect())
    }

    fn index_player(&self, player_id: &str, match_name: &str) -> MatchResult<()> {
        let mut players = self
            .players
            .write()
            .map_err(|_| MatchError::lock_poisoned("player index"))?;
        if players.contains_key(player_id) {
            return Err(MatchError::AlreadyJoined {
                player_id: player_id.to_string(),
            });
        }
        players.insert(player_id.to_string(), match_name.to_string());
        Ok(())
    }

    fn unindex_player(&self, player_id: &str) -> MatchResult<Option<String>> {
        let mut players = self
            .players
            .write()
            .map_err(|_| MatchError::lock_poisoned("player index"))?;
        Ok(players.remove(player_id))
    }
}
