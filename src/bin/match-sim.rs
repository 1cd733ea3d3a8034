//! Match Simulator CLI Tool
//!
//! Drives a single match against an in-memory host and prints what the
//! players would see, without a game server.
//!
//! Usage:
//!   cargo run --bin match-sim -- --help
//!   cargo run --bin match-sim run --players 6 --lobby-seconds 5 --walls-seconds 5
//!   cargo run --bin match-sim schedule --seconds 300

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use wallwars::game::{
    CountdownSchedule, MatchConfiguration, MatchManager, StaticMatchConfigProvider,
};
use wallwars::host::{HostCommand, HostServices, RecordingHost};
use wallwars::types::{AnnouncementScope, Location, Phase, Player, Point};
use wallwars::utils::TICKS_PER_SECOND;

#[derive(Parser)]
#[command(name = "match-sim")]
#[command(about = "Simulate a Wall Wars match against an in-memory host")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join players to a fresh match and tick it until the walls come down
    Run {
        /// Number of players to join
        #[arg(short, long, default_value = "8")]
        players: usize,
        /// Match capacity
        #[arg(short, long, default_value = "20")]
        capacity: usize,
        /// Pre-match countdown in seconds
        #[arg(long, default_value = "5")]
        lobby_seconds: u64,
        /// Walls countdown in seconds
        #[arg(long, default_value = "5")]
        walls_seconds: u64,
        /// Give up after this many ticks
        #[arg(short, long, default_value = "100000")]
        ticks: u64,
        /// Print every host command instead of the summary
        #[arg(short, long)]
        verbose: bool,
    },
    /// Print the announcement table of a countdown
    Schedule {
        /// Countdown length in seconds
        #[arg(short, long, default_value = "300")]
        seconds: u64,
        /// Tick rate
        #[arg(short, long, default_value_t = TICKS_PER_SECOND)]
        tps: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            players,
            capacity,
            lobby_seconds,
            walls_seconds,
            ticks,
            verbose,
        } => {
            let config = MatchConfiguration {
                capacity,
                lobby_countdown_seconds: lobby_seconds,
                walls_countdown_seconds: walls_seconds,
                ..MatchConfiguration::standard()
            };
            run_match(config, players, ticks, verbose).await?;
        }
        Commands::Schedule { seconds, tps } => {
            print_schedule(seconds, tps);
        }
    }

    Ok(())
}

async fn run_match(
    config: MatchConfiguration,
    players: usize,
    max_ticks: u64,
    verbose: bool,
) -> Result<()> {
    let host = Arc::new(RecordingHost::new());
    let manager = MatchManager::new(
        Arc::new(StaticMatchConfigProvider::with_config(config)?),
        HostServices::from_host(host.clone()),
    );

    let name = "sim";
    manager.create_match(name, "minecraft:overworld").await?;

    println!("🧱 Simulating match '{}' with {} players", name, players);
    for i in 0..players {
        let player = Player::new(format!("player-{}", i), format!("Player{}", i));
        let origin = Location::new("minecraft:overworld", Point::new(i as f64, 64.0, 0.0));
        if let Err(e) = manager.join_player(name, player, origin).await {
            println!("  ❌ Player{} refused: {}", i, e);
        }
    }

    let mut ticks = 0;
    while manager.phase_of(name).await? != Phase::WallsDown && ticks < max_ticks {
        manager.tick_match(name).await?;
        ticks += 1;
    }

    if verbose {
        for command in host.commands() {
            println!("  {:?}", command);
        }
    } else {
        for message in host.broadcasts(&AnnouncementScope::Match(name.to_string())) {
            println!("  📢 {}", message);
        }
    }

    let info = manager.get_match_info(name).await?;
    println!();
    println!("{}", info);
    for team in &info.teams {
        println!("    {} ({}): {:?}", team.label, team.name, team.members);
    }

    let barriers = host
        .commands()
        .into_iter()
        .filter(|command| matches!(command, HostCommand::LowerBarriers { .. }))
        .count();
    println!();
    println!(
        "Finished after {} ticks, barriers lowered {} time(s)",
        ticks, barriers
    );

    Ok(())
}

fn print_schedule(seconds: u64, tps: u64) {
    let config = MatchConfiguration {
        lobby_countdown_seconds: seconds,
        walls_countdown_seconds: seconds,
        ticks_per_second: tps,
        ..MatchConfiguration::standard()
    };

    for (title, schedule) in [
        ("Lobby", CountdownSchedule::lobby(&config)),
        ("Walls", CountdownSchedule::walls(&config)),
    ] {
        println!("{} countdown of {}s at {} ticks/s:", title, seconds, tps);
        for (offset, message) in schedule.announcements() {
            println!("  tick {:>6}: {}", offset, message);
        }
        println!(
            "  tick {:>6}: {} -> {}",
            schedule.duration(),
            schedule.final_message(),
            schedule.target()
        );
        println!();
    }
}
