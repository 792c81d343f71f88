//! TrackGuessr (tg-game) - Main entry point
//!
//! Terminal front-end for the round engine: resolves settings, opens the
//! score file, starts the game controller and runs the input loop until the
//! player quits or stdin closes.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tg_common::config::{
    load_toml_config_or_default, CompiledDefaults, Settings, SettingsOverrides,
};
use tg_common::events::EventBus;
use tg_game::quiz::HttpQuizClient;
use tg_game::scores::{FileKv, ScoreStore};
use tg_game::terminal::{help_text, TerminalView};
use tg_game::{ControllerConfig, GameController};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for tg-game
#[derive(Parser, Debug)]
#[command(name = "tg-game")]
#[command(about = "TrackGuessr music trivia in the terminal")]
#[command(version)]
struct Args {
    /// Base URL of the quiz backend
    #[arg(short, long, env = "TRACKGUESSR_BACKEND_URL")]
    backend_url: Option<String>,

    /// File holding best scores and the leaderboard
    #[arg(short, long, env = "TRACKGUESSR_DATA_FILE")]
    data_file: Option<PathBuf>,

    /// TOML config file (defaults to <config dir>/trackguessr/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pause after the last song before returning to the menu
    #[arg(long)]
    reset_delay_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config problems are reported once logging is up
    let (toml_config, config_problem) = load_toml_config_or_default(args.config.as_deref());

    let overrides = SettingsOverrides {
        backend_url: args.backend_url,
        data_file: args.data_file,
        round_reset_delay_ms: args.reset_delay_ms,
        log_level: args.log_level,
    };
    let settings = Settings::resolve(overrides, toml_config, CompiledDefaults::for_current_platform());

    init_tracing(&settings)?;
    if let Some(problem) = config_problem {
        warn!("{}; using defaults", problem);
    }

    info!("Starting TrackGuessr");
    info!("Backend: {}", settings.backend_url);
    info!("Score file: {}", settings.data_file.display());

    let source = Arc::new(
        HttpQuizClient::new(settings.backend_url.clone(), settings.request_timeout)
            .context("Failed to initialize quiz client")?,
    );
    let store = ScoreStore::open(FileKv::new(settings.data_file.clone()));

    let event_bus = EventBus::new(100);
    let mut events = event_bus.subscribe();

    let handle = GameController::new(
        source,
        store,
        event_bus,
        ControllerConfig {
            round_reset_delay: settings.round_reset_delay,
            ..Default::default()
        },
    )
    .spawn();

    let mut view = TerminalView::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", help_text());

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    for line in view.render(&event) {
                        println!("{}", line);
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Terminal fell behind on events"),
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match view.parse(&line) {
                    Ok(action) => {
                        if !view.dispatch(action, &handle).await? {
                            break;
                        }
                    }
                    Err(hint) => println!("{}", hint),
                }
            }
        }
    }

    handle.shutdown().await?;
    info!("Goodbye");
    Ok(())
}

/// Log to stderr, or append to the configured log file
fn init_tracing(settings: &Settings) -> Result<()> {
    let writer = match &settings.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let default_filter = format!(
        "tg_game={level},tg_common={level}",
        level = settings.log_level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();

    Ok(())
}
