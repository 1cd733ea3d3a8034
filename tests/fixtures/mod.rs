//! Test fixtures shared by the integration tests
#![allow(dead_code)]

use std::sync::Arc;
use wallwars::game::{MatchConfiguration, MatchManager, StaticMatchConfigProvider};
use wallwars::host::{HostServices, RecordingHost};
use wallwars::types::{AnnouncementScope, Location, Phase, Player, Point};

pub const SPACE: &str = "minecraft:overworld";

/// One second countdowns at one tick per second.
///
/// A started match then runs: announce "1 second", "Start!" into TeamAssign,
/// Staging, Active, "Walls will go down in 1 second!", "Walls go down!".
pub fn quick_config(capacity: usize) -> MatchConfiguration {
    MatchConfiguration {
        capacity,
        lobby_countdown_seconds: 1,
        walls_countdown_seconds: 1,
        ticks_per_second: 1,
        ..MatchConfiguration::standard()
    }
}

/// Manager wired to a recording host
pub struct TestSystem {
    pub manager: Arc<MatchManager>,
    pub host: Arc<RecordingHost>,
}

impl TestSystem {
    pub fn new(config: MatchConfiguration) -> Self {
        let host = Arc::new(RecordingHost::new());
        let provider = StaticMatchConfigProvider::with_config(config)
            .expect("test configuration should be valid");
        let manager = Arc::new(MatchManager::new(
            Arc::new(provider),
            HostServices::from_host(host.clone()),
        ));
        Self { manager, host }
    }

    /// Create a match and join `count` players named A, B, C, ...
    pub async fn with_match(config: MatchConfiguration, name: &str, count: usize) -> Self {
        let system = Self::new(config);
        system.manager.create_match(name, SPACE).await.unwrap();
        for player in players(count) {
            system.manager.join_player(name, player, origin()).await.unwrap();
        }
        system
    }

    /// Tick a match until it reaches `phase`; returns the ticks spent
    pub async fn tick_until(&self, name: &str, phase: Phase, max_ticks: u64) -> u64 {
        let mut ticks = 0;
        while self.manager.phase_of(name).await.unwrap() != phase {
            assert!(
                ticks < max_ticks,
                "match '{}' did not reach {} within {} ticks",
                name,
                phase,
                max_ticks
            );
            self.manager.tick_match(name).await.unwrap();
            ticks += 1;
        }
        ticks
    }

    pub fn announcements(&self, name: &str) -> Vec<String> {
        self.host
            .broadcasts(&AnnouncementScope::Match(name.to_string()))
    }
}

/// Player with a single-letter id and name: 0 -> "A", 1 -> "B", ...
pub fn lettered(i: usize) -> Player {
    let letter = char::from(b'A' + (i % 26) as u8).to_string();
    Player::new(letter.clone(), letter)
}

pub fn players(count: usize) -> Vec<Player> {
    (0..count).map(lettered).collect()
}

pub fn origin() -> Location {
    Location::new(SPACE, Point::new(100.0, 64.0, 100.0))
}
