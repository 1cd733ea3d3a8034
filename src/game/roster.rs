//! Flat list of the players joined to a match, in join order

use crate::error::{MatchError, MatchResult};
use crate::types::Player;

#[derive(Debug, Clone)]
pub struct Roster {
    match_name: String,
    capacity: usize,
    members: Vec<Player>,
}

impl Roster {
    pub fn new(match_name: impl Into<String>, capacity: usize) -> Self {
        Self {
            match_name: match_name.into(),
            capacity,
            members: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.members.iter().any(|p| p.id == player_id)
    }

    /// Members in join order
    pub fn members(&self) -> &[Player] {
        &self.members
    }

    /// Append a player. Duplicates are checked before capacity so a player
    /// already in a full match is told they are in, not that it is full.
    pub fn add(&mut self, player: Player) -> MatchResult<()> {
        if self.contains(&player.id) {
            return Err(MatchError::AlreadyJoined {
                player_id: player.id,
            });
        }
        if self.is_full() {
            return Err(MatchError::CapacityExceeded {
                match_name: self.match_name.clone(),
                capacity: self.capacity,
            });
        }
        self.members.push(player);
        Ok(())
    }

    /// Remove a player, keeping the order of the others
    pub fn remove(&mut self, player_id: &str) -> MatchResult<Player> {
        let position = self
            .members
            .iter()
            .position(|p| p.id == player_id)
            .ok_or_else(|| MatchError::PlayerNotFound {
                player_id: player_id.to_string(),
            })?;
        Ok(self.members.remove(position))
    }

    /// Empty the roster, returning the members in join order
    pub fn drain(&mut self) -> Vec<Player> {
        std::mem::take(&mut self.members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn player(id: &str) -> Player {
        Player::new(id, id.to_uppercase())
    }

    #[test]
    fn test_capacity_scenario() {
        let mut roster = Roster::new("arena", 2);
        assert!(roster.add(player("a")).is_ok());
        assert!(roster.add(player("b")).is_ok());
        assert_eq!(
            roster.add(player("c")),
            Err(MatchError::CapacityExceeded {
                match_name: "arena".to_string(),
                capacity: 2
            })
        );
        assert_eq!(roster.len(), 2);

        assert_eq!(roster.remove("a").unwrap().id, "a");
        assert!(roster.add(player("c")).is_ok());
        let ids: Vec<&str> = roster.members().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut roster = Roster::new("arena", 4);
        roster.add(player("a")).unwrap();
        assert_eq!(
            roster.add(player("a")),
            Err(MatchError::AlreadyJoined {
                player_id: "a".to_string()
            })
        );
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_remove_missing() {
        let mut roster = Roster::new("arena", 4);
        roster.add(player("a")).unwrap();
        assert!(matches!(
            roster.remove("b"),
            Err(MatchError::PlayerNotFound { .. })
        ));
        assert_eq!(roster.len(), 1);

        roster.remove("a").unwrap();
        assert!(roster.remove("a").unwrap_err().is_not_found());
    }

    #[test]
    fn test_drain() {
        let mut roster = Roster::new("arena", 4);
        roster.add(player("a")).unwrap();
        roster.add(player("b")).unwrap();

        let drained = roster.drain();
        assert_eq!(drained.len(), 2);
        assert!(roster.is_empty());
    }

    proptest! {
        #[test]
        fn prop_size_matches_successful_joins(capacity in 1usize..16, attempts in 0usize..40) {
            let mut roster = Roster::new("arena", capacity);
            let mut successes = 0;
            for i in 0..attempts {
                match roster.add(player(&format!("p{}", i))) {
                    Ok(()) => successes += 1,
                    Err(e) => prop_assert!(matches!(e, MatchError::CapacityExceeded { .. }), "unexpected error: {:?}", e),
                }
                prop_assert!(roster.len() <= capacity);
            }
            prop_assert_eq!(roster.len(), successes);
            prop_assert_eq!(successes, attempts.min(capacity));
        }
    }
}
