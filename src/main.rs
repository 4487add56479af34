//! Quickdraw duel runner
//!
//! Runs a duel in real time. By default a scripted autopilot plays the
//! human side; with `DUEL_AUTOPILOT_REACTION_MS=0` commands are read from
//! stdin instead (draw, release, holster, reset, new, target, practice on|off, ai on|off).

use rand::Rng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quickdraw::config::{Config, LogFormat};
use quickdraw::game::Duel;
use quickdraw::runner::{Autopilot, DuelCommand, DuelRunner, RunnerHandle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level, config.log_format);

    let pool = config.load_personality_pool()?;
    let settings = config.duel_settings(rand::thread_rng().gen());

    info!(
        seed = settings.seed,
        practice = settings.practice,
        enemy_ai = settings.enemy_ai,
        match_target = %settings.match_target,
        personalities = pool.entries().len(),
        "Starting Quickdraw"
    );

    let duel = Duel::with_pool(settings, pool);
    let autopilot = (config.autopilot_reaction_ms > 0).then(|| Autopilot::new(config.autopilot_reaction_ms));
    let interactive = autopilot.is_none();

    let (runner, handle) = DuelRunner::new(duel, config.tick_rate, autopilot, config.max_rounds);

    if interactive {
        info!("Autopilot disabled, reading commands from stdin");
        tokio::spawn(read_commands(handle.clone()));
    }

    let summary = runner.run(shutdown_signal()).await;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    info!("Quickdraw shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str, format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

/// Forward stdin lines to the runner until stdin closes
async fn read_commands(handle: RunnerHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match DuelCommand::parse(&line) {
                Some(cmd) => {
                    if handle.commands.send(cmd).is_err() {
                        break;
                    }
                }
                None => warn!(input = %line.trim(), "Unknown command"),
            },
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
