//! Integration tests for the wallwars match engine
//!
//! These tests drive the public manager API against a recording host:
//! - Capacity and membership rules for join and leave
//! - Round-robin team assignment and staging
//! - Countdown holding while the lobby is empty
//! - Teardown and cleanup of matches
//! - Refusal messages shown to players

mod fixtures;

use wallwars::error::MatchError;
use wallwars::game::JOINED_GAME_FLAG;
use wallwars::host::HostCommand;
use wallwars::types::{Phase, Severity};

use fixtures::{lettered, origin, players, quick_config, TestSystem, SPACE};

#[tokio::test]
async fn test_capacity_then_leave_frees_a_slot() {
    let system = TestSystem::with_match(quick_config(2), "arena", 2).await;
    let manager = &system.manager;

    let refused = manager.join_player("arena", lettered(2), origin()).await;
    assert!(matches!(refused, Err(MatchError::CapacityExceeded { .. })));
    assert_eq!(manager.get_match_info("arena").await.unwrap().player_count, 2);
    assert_eq!(
        system.host.messages_to("C"),
        vec![("Game arena is full!".to_string(), Severity::Error)]
    );
    assert!(system.host.pre_join_location("C").is_none());

    manager.leave_player("A").await.unwrap();
    manager.join_player("arena", lettered(2), origin()).await.unwrap();

    let info = manager.get_match_info("arena").await.unwrap();
    assert_eq!(info.players, vec!["B", "C"]);
    assert_eq!(manager.find_match_of("C").await.unwrap().as_deref(), Some("arena"));
    assert_eq!(manager.find_match_of("A").await.unwrap(), None);
}

#[tokio::test]
async fn test_five_players_round_robin() {
    let system = TestSystem::with_match(quick_config(20), "arena", 5).await;

    system.tick_until("arena", Phase::Staging, 10).await;

    let info = system.manager.get_match_info("arena").await.unwrap();
    let members: Vec<Vec<String>> = info.teams.iter().map(|t| t.members.clone()).collect();
    assert_eq!(
        members,
        vec![
            vec!["A".to_string(), "E".to_string()],
            vec!["B".to_string()],
            vec!["C".to_string()],
            vec!["D".to_string()],
        ]
    );
    assert_eq!(system.host.count_of_kind("remove_from_default_team"), 5);
}

#[tokio::test]
async fn test_empty_lobby_holds_countdown() {
    let system = TestSystem::new(quick_config(20));
    system.manager.create_match("arena", SPACE).await.unwrap();

    for _ in 0..1000 {
        system.manager.tick_match("arena").await.unwrap();
    }
    let info = system.manager.get_match_info("arena").await.unwrap();
    assert_eq!(info.phase, Phase::Lobby);
    assert_eq!(info.elapsed_ticks, 0);
    assert!(system.announcements("arena").is_empty());

    system
        .manager
        .join_player("arena", lettered(0), origin())
        .await
        .unwrap();
    system.manager.tick_match("arena").await.unwrap();

    assert_eq!(
        system.manager.get_match_info("arena").await.unwrap().elapsed_ticks,
        1
    );
}

#[tokio::test]
async fn test_leave_is_a_true_removal() {
    let system = TestSystem::with_match(quick_config(20), "arena", 6).await;
    system.tick_until("arena", Phase::Staging, 10).await;

    system.manager.leave_player("E").await.unwrap();

    let info = system.manager.get_match_info("arena").await.unwrap();
    assert!(!info.players.contains(&"E".to_string()));
    assert!(info
        .teams
        .iter()
        .all(|team| !team.members.contains(&"E".to_string())));
    assert_eq!(info.teams[0].members, vec!["A"]);

    assert!(!system.host.flag("E", JOINED_GAME_FLAG));
    assert!(system.host.pre_join_location("E").is_none());

    // A second leave is refused, not ignored
    let again = system.manager.leave_player("E").await;
    assert!(matches!(again, Err(MatchError::PlayerNotFound { .. })));
    assert_eq!(
        system.host.messages_to("E").last().cloned(),
        Some(("You are not in game!".to_string(), Severity::Error))
    );
}

#[tokio::test]
async fn test_refused_operations_change_nothing() {
    let system = TestSystem::with_match(quick_config(20), "arena", 3).await;
    let before = system.manager.get_match_info("arena").await.unwrap();

    let stranger = system.manager.leave_player("Z").await;
    assert!(matches!(stranger, Err(MatchError::PlayerNotFound { .. })));

    let twice = system
        .manager
        .join_player("arena", lettered(0), origin())
        .await;
    assert!(matches!(twice, Err(MatchError::AlreadyJoined { .. })));
    assert_eq!(
        system.host.messages_to("A").last().cloned(),
        Some(("You are already in a game!".to_string(), Severity::Error))
    );

    let after = system.manager.get_match_info("arena").await.unwrap();
    assert_eq!(before.players, after.players);
    assert_eq!(before.phase, after.phase);

    // Still tickable
    system.tick_until("arena", Phase::WallsDown, 10).await;
}

#[tokio::test]
async fn test_terminal_phase_is_inert() {
    let system = TestSystem::with_match(quick_config(20), "arena", 4).await;
    system.tick_until("arena", Phase::WallsDown, 10).await;

    let settled = system.manager.get_match_info("arena").await.unwrap();
    let commands = system.host.commands().len();

    for _ in 0..50 {
        system.manager.tick_match("arena").await.unwrap();
    }

    let info = system.manager.get_match_info("arena").await.unwrap();
    assert_eq!(info.phase, Phase::WallsDown);
    assert_eq!(info.elapsed_ticks, settled.elapsed_ticks);
    assert_eq!(system.host.commands().len(), commands);
    assert_eq!(system.host.count_of_kind("lower_barriers"), 1);
}

#[tokio::test]
async fn test_remove_game_forces_everyone_out() {
    let system = TestSystem::with_match(quick_config(20), "arena", 3).await;
    system.tick_until("arena", Phase::Active, 10).await;

    let removed = system.manager.remove_game("arena").await.unwrap();
    assert_eq!(removed, players(3));

    for player in players(3) {
        assert!(!system.host.flag(&player.id, JOINED_GAME_FLAG));
        assert_eq!(system.manager.find_match_of(&player.id).await.unwrap(), None);
        let kinds: Vec<&str> = system
            .host
            .commands_for(&player.id)
            .iter()
            .map(HostCommand::kind)
            .collect();
        assert!(kinds.contains(&"return_to_lobby"));
        assert!(kinds.contains(&"assign_default_team"));
    }

    assert!(system.manager.games_info().await.unwrap().is_empty());
    let missing = system.manager.remove_game("arena").await;
    assert!(matches!(missing, Err(MatchError::MatchNotFound { .. })));
}

#[tokio::test]
async fn test_abandoned_match_is_cleaned_up() {
    let system = TestSystem::with_match(quick_config(20), "arena", 2).await;
    system.manager.create_match("waiting", SPACE).await.unwrap();
    system.tick_until("arena", Phase::Active, 10).await;

    system.manager.leave_player("A").await.unwrap();
    assert_eq!(system.manager.cleanup_finished_matches().await.unwrap(), 0);

    system.manager.leave_player("B").await.unwrap();
    assert_eq!(system.manager.cleanup_finished_matches().await.unwrap(), 1);

    let remaining: Vec<String> = system
        .manager
        .games_info()
        .await
        .unwrap()
        .into_iter()
        .map(|info| info.name)
        .collect();
    assert_eq!(remaining, vec!["waiting"]);
}

#[tokio::test]
async fn test_join_unknown_match() {
    let system = TestSystem::new(quick_config(20));

    let result = system
        .manager
        .join_player("nowhere", lettered(0), origin())
        .await;

    assert!(matches!(result, Err(MatchError::MatchNotFound { .. })));
    assert_eq!(
        system.host.messages_to("A"),
        vec![("Game nowhere doesn't exist!".to_string(), Severity::Error)]
    );
    assert_eq!(system.manager.find_match_of("A").await.unwrap(), None);
}

#[tokio::test]
async fn test_stats_track_lifecycle() {
    let system = TestSystem::with_match(quick_config(2), "arena", 2).await;
    let _ = system
        .manager
        .join_player("arena", lettered(2), origin())
        .await;
    system.tick_until("arena", Phase::WallsDown, 10).await;

    let stats = system.manager.get_stats().await.unwrap();
    assert_eq!(stats.matches_created, 1);
    assert_eq!(stats.players_joined, 2);
    assert_eq!(stats.joins_rejected, 1);
    assert_eq!(stats.phase_transitions, 4);
    assert_eq!(stats.active_matches, 1);
    assert_eq!(stats.players_in_matches, 2);
    assert_eq!(stats.dispatch_failures, 0);
}
