//! Main entry point for the Wall Wars match engine
//!
//! This is the production entry point that initializes and runs the match
//! engine with proper error handling, logging, and graceful shutdown.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tokio::time::Duration;
use tracing::{error, info, warn};
use wallwars::config::{validate_config, AppConfig};
use wallwars::service::{AppState, HealthCheck, HealthStatus};

/// Wall Wars Match Engine - team-based minigame lifecycle service
#[derive(Parser)]
#[command(
    name = "wallwars",
    version,
    about = "Match lifecycle engine for the Wall Wars minigame",
    long_about = "Wall Wars runs named matches through lobby, team assignment, staging, \
                 active play and walls down, driven by a fixed-rate tick. Players are split \
                 round-robin into four teams and teleported to their plots before the walls \
                 separating them are lowered."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Perform health check and exit
    #[arg(long, help = "Perform a health check and exit with status code")]
    health_check: bool,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Metrics port override
    #[arg(long, value_name = "PORT", help = "Override metrics server port")]
    metrics_port: Option<u16>,

    /// Tick rate override
    #[arg(long, value_name = "TPS", help = "Override ticks per second")]
    ticks_per_second: Option<u64>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Perform health check and return appropriate exit code
async fn perform_health_check(config: AppConfig) -> Result<()> {
    info!("Performing health check...");

    let service_name = config.service.name.clone();
    let mut app_state = AppState::new(config).await?;
    app_state.start_engine().await?;

    let result = HealthCheck::check(&app_state.manager(), &service_name).await;
    app_state.shutdown().await?;

    match result {
        Ok(health) => {
            println!("Health Check: {}", health.status);
            println!("  Active Matches: {}", health.stats.active_matches);
            println!("  Players In Matches: {}", health.stats.players_in_matches);
            println!("  Ticks: {}", health.stats.ticks);
            println!("  Dispatch Failures: {}", health.stats.dispatch_failures);

            if health.status == HealthStatus::Healthy {
                std::process::exit(0);
            } else {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Log a periodic summary of the live matches
async fn status_report_task(manager: std::sync::Arc<wallwars::MatchManager>) {
    let mut interval = tokio::time::interval(Duration::from_secs(30));

    loop {
        interval.tick().await;

        match manager.games_info().await {
            Ok(games) => {
                for game in games {
                    info!(
                        "Match '{}': {} in {} ({} players)",
                        game.name, game.phase, game.space, game.player_count
                    );
                }
            }
            Err(e) => {
                warn!("Status report failed: {}", e);
            }
        }
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("🧱 Wall Wars Match Engine");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Metrics port: {}", config.service.metrics_port);
    info!("   Tick rate: {}/s", config.engine.ticks_per_second);
    info!("   Max players: {}", config.engine.max_players);
    info!(
        "   Countdowns: lobby {}s, walls {}s",
        config.engine.lobby_countdown_seconds, config.engine.walls_countdown_seconds
    );
    info!("   Initial matches: {}", config.engine.initial_matches.len());
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(metrics_port) = args.metrics_port {
        config.service.metrics_port = metrics_port;
    }

    if let Some(tps) = args.ticks_per_second {
        config.engine.ticks_per_second = tps;
    }

    validate_config(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.health_check {
        return perform_health_check(config).await;
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    info!("Initializing service components...");
    let mut app_state = match AppState::new(config.clone()).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting service...");
    if let Err(e) = app_state.start().await {
        error!("Failed to start service: {}", e);
        std::process::exit(1);
    }

    let status_task = tokio::spawn(status_report_task(app_state.manager()));

    info!("✅ Wall Wars match engine is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    wait_for_shutdown_signal().await;

    info!("🛑 Shutdown signal received, beginning graceful shutdown...");
    status_task.abort();

    let shutdown_timeout = config.shutdown_timeout();
    match tokio::time::timeout(shutdown_timeout, app_state.shutdown()).await {
        Ok(Ok(())) => {
            info!("✅ Graceful shutdown completed successfully");
        }
        Ok(Err(e)) => {
            error!("Shutdown failed: {}", e);
        }
        Err(_) => {
            warn!("⚠️  Shutdown timeout exceeded, forcing exit");
        }
    }

    info!("🛑 Wall Wars match engine stopped");
    Ok(())
}
