//! ED AFK Notifier - Elite Dangerous journal notifications for AFK sessions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ed_afk_notifier::bots::{build_notifier, NotifyError, CHECK_MESSAGE};
use ed_afk_notifier::config::{AppConfig, ConfigError, ConfigLoader, SettingsWatcher};
use ed_afk_notifier::display;
use ed_afk_notifier::engine::{Engine, EngineError};
use ed_afk_notifier::journal::{find_latest_journal, JournalError, StateReconstructor};
use ed_afk_notifier::status::{StatusError, StatusServer};

#[derive(Parser)]
#[command(
    name = "ed-afk-notifier",
    about = "Notifications for Elite Dangerous AFK sessions, driven by the game journal",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file to use instead of the default search paths.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow the journal and send notifications until Ctrl-C.
    Run,
    /// Reconstruct state from a journal and print the counters.
    Replay {
        /// Journal file to read instead of the latest one.
        #[arg(short, long)]
        journal: Option<PathBuf>,
    },
    /// Print the journal that would be followed.
    Locate,
    /// Send a test message through the configured bot.
    Check,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Journal(#[from] JournalError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error(transparent)]
    Status(#[from] StatusError),
}

fn init_tracing(verbosity: u8, journal_debug: bool) {
    let level = match verbosity {
        0 if journal_debug => "debug",
        0 => "warn",
        1 if journal_debug => "debug",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

fn journal_dir(config: &AppConfig) -> Result<PathBuf, EngineError> {
    config
        .journal
        .resolved_path()
        .ok_or(EngineError::NoJournalDir)
}

async fn run(config: AppConfig, config_path: Option<PathBuf>) -> Result<(), CliError> {
    config.log_summary();

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, shutting down");
        }
        signal_token.cancel();
    });

    let notifier = build_notifier(&config)?;
    let mut engine = Engine::from_config(&config, notifier)?;
    let mut tasks = Vec::new();

    if let Some(path) = config_path {
        let (watcher, settings_rx) = SettingsWatcher::new(path, config.notify);
        engine = engine.with_settings_updates(settings_rx);
        tasks.push(tokio::spawn(watcher.run(shutdown.clone())));
    }

    if config.status.enabled {
        let server = StatusServer::new(engine.subscribe()).with_config(config.status.clone());
        let cancel = shutdown.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = server.run(cancel).await {
                tracing::error!(error = %e, "Status server failed");
            }
        }));
    }

    let result = engine.run(shutdown.clone()).await;
    shutdown.cancel();
    for task in tasks {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Background task failed");
        }
    }

    let state = result?;
    tracing::info!(
        killed_pirates = state.killed_pirates,
        active_missions = state.active_missions,
        "Stopped"
    );
    Ok(())
}

async fn replay(config: &AppConfig, journal: Option<PathBuf>) -> Result<(), CliError> {
    let path = match journal {
        Some(path) => path,
        None => find_latest_journal(&journal_dir(config)?)?,
    };
    let baseline = StateReconstructor::reconstruct(&path).await?;
    display::print_state_summary(&baseline.path, &baseline.state);
    Ok(())
}

fn locate(config: &AppConfig) -> Result<(), CliError> {
    let path = find_latest_journal(&journal_dir(config)?)?;
    display::print_journal(&path);
    Ok(())
}

async fn check(config: &AppConfig) -> Result<(), CliError> {
    let notifier = build_notifier(config)?;
    notifier.send(CHECK_MESSAGE).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loader = cli
        .config
        .clone()
        .map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let loaded = loader.load();
    let journal_debug = loaded.as_ref().is_ok_and(|c| c.journal.debug);
    init_tracing(cli.verbose, journal_debug);

    let result = match loaded {
        Err(e) => Err(CliError::from(e)),
        Ok(config) => match cli.command {
            Commands::Run => run(config, loader.find_config_file()).await,
            Commands::Replay { journal } => replay(&config, journal).await,
            Commands::Locate => locate(&config),
            Commands::Check => check(&config).await,
        },
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Fatal error");
        display::print_error(&e.to_string());
        std::process::exit(1);
    }
}
